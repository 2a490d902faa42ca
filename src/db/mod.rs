mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, Row};
use uuid::Uuid;

use crate::models::*;
use crate::store::StaffingStore;

const DATE_FORMAT: &str = "%Y-%m-%d";

const CONTRIBUTOR_COLUMNS: &str =
    "c.id, c.first_name, c.last_name, c.email, c.active, c.created_at, c.updated_at";

const PROJECT_SELECT: &str =
    "SELECT p.id, p.name, p.status, p.is_internal, p.start_date, p.end_date, p.created_at, p.updated_at,
            cl.id, cl.name, cl.service_level
     FROM projects p LEFT JOIN clients cl ON cl.id = p.client_id";

const TASK_SELECT: &str =
    "SELECT t.id, t.project_id, t.name, t.status, t.active, t.counts_for_profitability, t.task_type,
            t.required_profile_id, pr.name, t.assigned_contributor_id,
            t.estimated_hours_sold, t.estimated_hours_revised, t.position, t.created_at
     FROM project_tasks t LEFT JOIN profiles pr ON pr.id = t.required_profile_id";

const PLANNING_SELECT: &str =
    "SELECT id, contributor_id, project_id, start_date, end_date, daily_hours, status, notes, created_at, updated_at
     FROM plannings";

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "staffing")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let db_path = dirs.data_dir().join("staffing.db");
        Self::open(db_path)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // Client and Profile operations
    // ============================================================

    pub fn create_client(&self, input: CreateClientInput) -> Result<Client> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();

        conn.execute(
            "INSERT INTO clients (id, name, service_level, created_at) VALUES (?, ?, ?, ?)",
            (
                id.to_string(),
                &input.name,
                input.service_level.map(|l| l.as_str()),
                Utc::now().to_rfc3339(),
            ),
        )?;

        Ok(Client {
            id,
            name: input.name,
            service_level: input.service_level,
        })
    }

    pub fn create_profile(&self, name: &str) -> Result<Profile> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();

        conn.execute(
            "INSERT INTO profiles (id, name) VALUES (?, ?)",
            (id.to_string(), name),
        )?;

        Ok(Profile {
            id,
            name: name.to_string(),
        })
    }

    // ============================================================
    // Contributor operations
    // ============================================================

    pub fn create_contributor(&self, input: CreateContributorInput) -> Result<Contributor> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO contributors (id, first_name, last_name, email, active, created_at, updated_at)
             VALUES (?, ?, ?, ?, 1, ?, ?)",
            (
                id.to_string(),
                &input.first_name,
                &input.last_name,
                &input.email,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        for profile_id in &input.profile_ids {
            conn.execute(
                "INSERT INTO contributor_profiles (contributor_id, profile_id) VALUES (?, ?)",
                (id.to_string(), profile_id.to_string()),
            )?;
        }

        Ok(Contributor {
            id,
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            active: true,
            profiles: load_profiles(&conn, id)?,
            created_at: now,
            updated_at: now,
        })
    }

    /// Deactivates (or reactivates) a contributor. Contributors are never deleted.
    pub fn set_contributor_active(&self, id: Uuid, active: bool) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute(
            "UPDATE contributors SET active = ?, updated_at = ? WHERE id = ?",
            (
                if active { 1 } else { 0 },
                Utc::now().to_rfc3339(),
                id.to_string(),
            ),
        )?;
        Ok(rows > 0)
    }

    pub fn create_employment_period(
        &self,
        input: CreateEmploymentPeriodInput,
    ) -> Result<EmploymentPeriod> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();

        conn.execute(
            "INSERT INTO employment_periods (id, contributor_id, start_date, end_date, weekly_hours, work_time_percentage, daily_rate)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                input.contributor_id.to_string(),
                format_date(input.start_date),
                input.end_date.map(format_date),
                input.weekly_hours,
                input.work_time_percentage,
                input.daily_rate,
            ),
        )?;

        Ok(EmploymentPeriod {
            id,
            contributor_id: input.contributor_id,
            start_date: input.start_date,
            end_date: input.end_date,
            weekly_hours: input.weekly_hours,
            work_time_percentage: input.work_time_percentage,
            daily_rate: input.daily_rate,
        })
    }

    pub fn create_vacation(&self, input: CreateVacationInput) -> Result<Vacation> {
        if input.end_date < input.start_date {
            anyhow::bail!("Vacation ends before it starts");
        }

        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();

        conn.execute(
            "INSERT INTO vacations (id, contributor_id, start_date, end_date, kind, status)
             VALUES (?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                input.contributor_id.to_string(),
                format_date(input.start_date),
                format_date(input.end_date),
                input.kind.as_str(),
                input.status.as_str(),
            ),
        )?;

        Ok(Vacation {
            id,
            contributor_id: input.contributor_id,
            start_date: input.start_date,
            end_date: input.end_date,
            kind: input.kind,
            status: input.status,
        })
    }

    // ============================================================
    // Project and Task operations
    // ============================================================

    pub fn create_project(&self, input: CreateProjectInput) -> Result<Project> {
        let client = match input.client_id {
            Some(client_id) => Some(
                self.get_client(client_id)?
                    .ok_or_else(|| anyhow::anyhow!("Client not found"))?,
            ),
            None => None,
        };

        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;
        let id = Uuid::new_v4();
        let now = Utc::now();
        let status = input.status.unwrap_or(ProjectStatus::Active);

        tx.execute(
            "INSERT INTO projects (id, name, status, is_internal, client_id, start_date, end_date, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &input.name,
                status.as_str(),
                if input.is_internal { 1 } else { 0 },
                input.client_id.map(|u| u.to_string()),
                input.start_date.map(format_date),
                input.end_date.map(format_date),
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        for profile_id in &input.required_profile_ids {
            tx.execute(
                "INSERT INTO project_required_profiles (project_id, profile_id) VALUES (?, ?)",
                (id.to_string(), profile_id.to_string()),
            )?;
        }
        let required_profiles = load_project_profiles(&tx, id)?;
        tx.commit()?;

        Ok(Project {
            id,
            name: input.name,
            status,
            is_internal: input.is_internal,
            client,
            required_profiles,
            start_date: input.start_date,
            end_date: input.end_date,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get_client(&self, id: Uuid) -> Result<Option<Client>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare("SELECT id, name, service_level FROM clients WHERE id = ?")?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Client {
                id: parse_uuid(row.get::<_, String>(0)?),
                name: row.get(1)?,
                service_level: row
                    .get::<_, Option<String>>(2)?
                    .and_then(|s| ServiceLevel::from_str(&s)),
            }))
        } else {
            Ok(None)
        }
    }

    pub fn create_task(&self, project_id: Uuid, input: CreateTaskInput) -> Result<ProjectTask> {
        self.find_project(project_id)?
            .ok_or_else(|| anyhow::anyhow!("Project not found"))?;

        let conn = self.conn.lock().expect("database lock poisoned");
        let required_profile = match input.required_profile_id {
            Some(profile_id) => Some(
                load_profile(&conn, profile_id)?
                    .ok_or_else(|| anyhow::anyhow!("Profile not found"))?,
            ),
            None => None,
        };

        let id = Uuid::new_v4();
        let now = Utc::now();
        let status = input.status.unwrap_or(TaskStatus::NotStarted);
        let task_type = input.task_type.unwrap_or(TaskType::Regular);
        let position = match input.position {
            Some(position) => position,
            None => conn.query_row(
                "SELECT COALESCE(MAX(position), -1) + 1 FROM project_tasks WHERE project_id = ?",
                [project_id.to_string()],
                |row| row.get(0),
            )?,
        };

        conn.execute(
            "INSERT INTO project_tasks (id, project_id, name, status, active, counts_for_profitability, task_type,
                                        required_profile_id, assigned_contributor_id, estimated_hours_sold,
                                        estimated_hours_revised, position, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                project_id.to_string(),
                &input.name,
                status.as_str(),
                if input.active { 1 } else { 0 },
                if input.counts_for_profitability { 1 } else { 0 },
                task_type.as_str(),
                input.required_profile_id.map(|u| u.to_string()),
                input.assigned_contributor_id.map(|u| u.to_string()),
                input.estimated_hours_sold,
                input.estimated_hours_revised,
                position,
                now.to_rfc3339(),
            ),
        )?;

        Ok(ProjectTask {
            id,
            project_id,
            name: input.name,
            status,
            active: input.active,
            counts_for_profitability: input.counts_for_profitability,
            task_type,
            required_profile,
            assigned_contributor_id: input.assigned_contributor_id,
            estimated_hours_sold: input.estimated_hours_sold,
            estimated_hours_revised: input.estimated_hours_revised,
            position,
            created_at: now,
        })
    }

    // ============================================================
    // Staffing metric operations
    // ============================================================

    pub fn record_staffing_metric(&self, input: RecordMetricInput) -> Result<StaffingMetric> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();

        conn.execute(
            "INSERT INTO staffing_metrics (id, contributor_id, period_date, granularity, available_days,
                                           worked_days, planned_days, vacation_days, tace)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                input.contributor_id.map(|u| u.to_string()),
                format_date(input.period_date),
                input.granularity.as_str(),
                input.available_days,
                input.worked_days,
                input.planned_days,
                input.vacation_days,
                input.tace,
            ),
        )?;

        Ok(StaffingMetric {
            id,
            contributor_id: input.contributor_id,
            period_date: input.period_date,
            granularity: input.granularity,
            available_days: input.available_days,
            worked_days: input.worked_days,
            planned_days: input.planned_days,
            vacation_days: input.vacation_days,
            tace: input.tace,
        })
    }

    // ============================================================
    // Planning operations
    // ============================================================

    pub fn get_planning(&self, id: Uuid) -> Result<Option<Planning>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        load_planning(&conn, id)
    }
}

impl StaffingStore for Database {
    fn find_active_contributors(&self) -> Result<Vec<Contributor>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {CONTRIBUTOR_COLUMNS} FROM contributors c
             WHERE c.active = 1 ORDER BY c.last_name, c.first_name"
        ))?;

        let contributors = stmt
            .query_map([], contributor_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        with_profiles(&conn, contributors)
    }

    fn find_contributor(&self, id: Uuid) -> Result<Option<Contributor>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {CONTRIBUTOR_COLUMNS} FROM contributors c WHERE c.id = ?"
        ))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            let mut contributor = contributor_from_row(row)?;
            contributor.profiles = load_profiles(&conn, contributor.id)?;
            Ok(Some(contributor))
        } else {
            Ok(None)
        }
    }

    fn find_staffing_metrics(
        &self,
        contributor_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        granularity: Granularity,
    ) -> Result<Vec<StaffingMetric>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, contributor_id, period_date, granularity, available_days, worked_days,
                    planned_days, vacation_days, tace
             FROM staffing_metrics
             WHERE contributor_id = ? AND granularity = ? AND period_date >= ? AND period_date <= ?
             ORDER BY period_date",
        )?;

        let metrics = stmt
            .query_map(
                (
                    contributor_id.to_string(),
                    granularity.as_str(),
                    format_date(start),
                    format_date(end),
                ),
                |row| {
                    Ok(StaffingMetric {
                        id: parse_uuid(row.get::<_, String>(0)?),
                        contributor_id: row.get::<_, Option<String>>(1)?.map(parse_uuid),
                        period_date: parse_date(row.get::<_, String>(2)?)?,
                        granularity: Granularity::from_str(&row.get::<_, String>(3)?)
                            .unwrap_or(Granularity::Weekly),
                        available_days: row.get(4)?,
                        worked_days: row.get(5)?,
                        planned_days: row.get(6)?,
                        vacation_days: row.get(7)?,
                        tace: row.get(8)?,
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(metrics)
    }

    fn find_plannings(&self, filter: PlanningFilter) -> Result<Vec<Planning>> {
        let conn = self.conn.lock().expect("database lock poisoned");

        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(contributor_id) = filter.contributor_id {
            conditions.push("contributor_id = ?");
            params.push(Box::new(contributor_id.to_string()));
        }
        if let Some(project_id) = filter.project_id {
            conditions.push("project_id = ?");
            params.push(Box::new(project_id.to_string()));
        }
        if let Some((start, end)) = filter.overlapping {
            conditions.push("start_date <= ?");
            params.push(Box::new(format_date(end)));
            conditions.push("end_date >= ?");
            params.push(Box::new(format_date(start)));
        }

        let sql = if conditions.is_empty() {
            format!("{PLANNING_SELECT} ORDER BY start_date, created_at")
        } else {
            format!(
                "{PLANNING_SELECT} WHERE {} ORDER BY start_date, created_at",
                conditions.join(" AND ")
            )
        };

        let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let plannings = stmt
            .query_map(params_ref.as_slice(), planning_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(plannings)
    }

    fn find_project(&self, id: Uuid) -> Result<Option<Project>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!("{PROJECT_SELECT} WHERE p.id = ?"))?;

        let mut rows = stmt.query([id.to_string()])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let mut project = project_from_row(row)?;
        project.required_profiles = load_project_profiles(&conn, project.id)?;
        Ok(Some(project))
    }

    fn find_active_external_projects(&self) -> Result<Vec<Project>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "{PROJECT_SELECT} WHERE p.status = 'active' AND p.is_internal = 0 ORDER BY p.name"
        ))?;

        let projects = stmt
            .query_map([], project_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        projects
            .into_iter()
            .map(|mut project| {
                project.required_profiles = load_project_profiles(&conn, project.id)?;
                Ok(project)
            })
            .collect()
    }

    fn find_candidate_tasks(&self, project_id: Uuid) -> Result<Vec<ProjectTask>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "{TASK_SELECT}
             WHERE t.project_id = ?
               AND t.active = 1
               AND t.status != 'completed'
               AND t.counts_for_profitability = 1
               AND t.required_profile_id IS NOT NULL
             ORDER BY t.position, t.created_at"
        ))?;

        let tasks = stmt
            .query_map([project_id.to_string()], task_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tasks)
    }

    fn find_contributors_with_profile(&self, profile_id: Uuid) -> Result<Vec<Contributor>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {CONTRIBUTOR_COLUMNS} FROM contributors c
             JOIN contributor_profiles cp ON cp.contributor_id = c.id
             WHERE cp.profile_id = ? AND c.active = 1
             ORDER BY c.last_name, c.first_name"
        ))?;

        let contributors = stmt
            .query_map([profile_id.to_string()], contributor_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        with_profiles(&conn, contributors)
    }

    fn find_active_employment_period(
        &self,
        contributor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<EmploymentPeriod>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, contributor_id, start_date, end_date, weekly_hours, work_time_percentage, daily_rate
             FROM employment_periods
             WHERE contributor_id = ? AND start_date <= ? AND (end_date IS NULL OR end_date >= ?)
             ORDER BY start_date DESC LIMIT 1",
        )?;

        let day = format_date(date);
        let mut rows = stmt.query((contributor_id.to_string(), &day, &day))?;
        if let Some(row) = rows.next()? {
            Ok(Some(EmploymentPeriod {
                id: parse_uuid(row.get::<_, String>(0)?),
                contributor_id: parse_uuid(row.get::<_, String>(1)?),
                start_date: parse_date(row.get::<_, String>(2)?)?,
                end_date: row
                    .get::<_, Option<String>>(3)?
                    .map(parse_date)
                    .transpose()?,
                weekly_hours: row.get(4)?,
                work_time_percentage: row.get(5)?,
                daily_rate: row.get(6)?,
            }))
        } else {
            Ok(None)
        }
    }

    fn has_approved_vacation(
        &self,
        contributor_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let count: i32 = conn.query_row(
            "SELECT COUNT(*) FROM vacations
             WHERE contributor_id = ? AND status = 'approved' AND end_date >= ? AND start_date <= ?",
            (
                contributor_id.to_string(),
                format_date(start),
                format_date(end),
            ),
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn create_planning(&self, input: CreatePlanningInput) -> Result<Planning> {
        let conn = self.conn.lock().expect("database lock poisoned");
        insert_planning(&conn, input)
    }

    fn update_planning(&self, id: Uuid, input: UpdatePlanningInput) -> Result<Option<Planning>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        update_planning_row(&conn, id, input)
    }

    fn transfer_planning(
        &self,
        source_id: Uuid,
        update: UpdatePlanningInput,
        target: CreatePlanningInput,
    ) -> Result<Option<(Planning, Planning)>> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn.transaction()?;

        let Some(source) = update_planning_row(&tx, source_id, update)? else {
            return Ok(None);
        };
        let created = insert_planning(&tx, target)?;

        tx.commit()?;
        Ok(Some((source, created)))
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

// ============================================================
// Planning writes
// ============================================================

fn load_planning(conn: &Connection, id: Uuid) -> Result<Option<Planning>> {
    let mut stmt = conn.prepare(&format!("{PLANNING_SELECT} WHERE id = ?"))?;

    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        Ok(Some(planning_from_row(row)?))
    } else {
        Ok(None)
    }
}

fn insert_planning(conn: &Connection, input: CreatePlanningInput) -> Result<Planning> {
    if input.end_date < input.start_date {
        anyhow::bail!("Planning ends before it starts");
    }

    let id = Uuid::new_v4();
    let now = Utc::now();
    let status = input.status.unwrap_or(PlanningStatus::Planned);

    conn.execute(
        "INSERT INTO plannings (id, contributor_id, project_id, start_date, end_date, daily_hours, status, notes, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        (
            id.to_string(),
            input.contributor_id.to_string(),
            input.project_id.to_string(),
            format_date(input.start_date),
            format_date(input.end_date),
            input.daily_hours,
            status.as_str(),
            &input.notes,
            now.to_rfc3339(),
            now.to_rfc3339(),
        ),
    )?;

    Ok(Planning {
        id,
        contributor_id: input.contributor_id,
        project_id: input.project_id,
        start_date: input.start_date,
        end_date: input.end_date,
        daily_hours: input.daily_hours,
        status,
        notes: input.notes,
        created_at: now,
        updated_at: now,
    })
}

/// Merges `input` into the stored row. `None` if no planning has this id.
fn update_planning_row(
    conn: &Connection,
    id: Uuid,
    input: UpdatePlanningInput,
) -> Result<Option<Planning>> {
    let Some(existing) = load_planning(conn, id)? else {
        return Ok(None);
    };

    let now = Utc::now();
    let start_date = input.start_date.unwrap_or(existing.start_date);
    let end_date = input.end_date.unwrap_or(existing.end_date);
    let daily_hours = input.daily_hours.unwrap_or(existing.daily_hours);
    let status = input.status.unwrap_or(existing.status);
    let notes = input.notes.or(existing.notes);

    conn.execute(
        "UPDATE plannings SET start_date = ?, end_date = ?, daily_hours = ?, status = ?, notes = ?, updated_at = ?
         WHERE id = ?",
        (
            format_date(start_date),
            format_date(end_date),
            daily_hours,
            status.as_str(),
            &notes,
            now.to_rfc3339(),
            id.to_string(),
        ),
    )?;

    Ok(Some(Planning {
        id,
        contributor_id: existing.contributor_id,
        project_id: existing.project_id,
        start_date,
        end_date,
        daily_hours,
        status,
        notes,
        created_at: existing.created_at,
        updated_at: now,
    }))
}

// ============================================================
// Row mapping
// ============================================================

fn contributor_from_row(row: &Row<'_>) -> rusqlite::Result<Contributor> {
    Ok(Contributor {
        id: parse_uuid(row.get::<_, String>(0)?),
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        active: row.get::<_, i32>(4)? != 0,
        profiles: Vec::new(),
        created_at: parse_datetime(row.get::<_, String>(5)?),
        updated_at: parse_datetime(row.get::<_, String>(6)?),
    })
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    let client = match row.get::<_, Option<String>>(8)? {
        Some(client_id) => Some(Client {
            id: parse_uuid(client_id),
            name: row.get(9)?,
            service_level: row
                .get::<_, Option<String>>(10)?
                .and_then(|s| ServiceLevel::from_str(&s)),
        }),
        None => None,
    };

    Ok(Project {
        id: parse_uuid(row.get::<_, String>(0)?),
        name: row.get(1)?,
        status: ProjectStatus::from_str(&row.get::<_, String>(2)?)
            .unwrap_or(ProjectStatus::Active),
        is_internal: row.get::<_, i32>(3)? != 0,
        client,
        required_profiles: Vec::new(),
        start_date: row.get::<_, Option<String>>(4)?.map(parse_date).transpose()?,
        end_date: row.get::<_, Option<String>>(5)?.map(parse_date).transpose()?,
        created_at: parse_datetime(row.get::<_, String>(6)?),
        updated_at: parse_datetime(row.get::<_, String>(7)?),
    })
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<ProjectTask> {
    let required_profile = match row.get::<_, Option<String>>(7)? {
        Some(profile_id) => Some(Profile {
            id: parse_uuid(profile_id),
            name: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
        }),
        None => None,
    };

    Ok(ProjectTask {
        id: parse_uuid(row.get::<_, String>(0)?),
        project_id: parse_uuid(row.get::<_, String>(1)?),
        name: row.get(2)?,
        status: TaskStatus::from_str(&row.get::<_, String>(3)?).unwrap_or(TaskStatus::NotStarted),
        active: row.get::<_, i32>(4)? != 0,
        counts_for_profitability: row.get::<_, i32>(5)? != 0,
        task_type: TaskType::from_str(&row.get::<_, String>(6)?).unwrap_or(TaskType::Regular),
        required_profile,
        assigned_contributor_id: row.get::<_, Option<String>>(9)?.map(parse_uuid),
        estimated_hours_sold: row.get(10)?,
        estimated_hours_revised: row.get(11)?,
        position: row.get(12)?,
        created_at: parse_datetime(row.get::<_, String>(13)?),
    })
}

fn planning_from_row(row: &Row<'_>) -> rusqlite::Result<Planning> {
    Ok(Planning {
        id: parse_uuid(row.get::<_, String>(0)?),
        contributor_id: parse_uuid(row.get::<_, String>(1)?),
        project_id: parse_uuid(row.get::<_, String>(2)?),
        start_date: parse_date(row.get::<_, String>(3)?)?,
        end_date: parse_date(row.get::<_, String>(4)?)?,
        daily_hours: row.get(5)?,
        status: PlanningStatus::from_str(&row.get::<_, String>(6)?)
            .unwrap_or(PlanningStatus::Planned),
        notes: row.get(7)?,
        created_at: parse_datetime(row.get::<_, String>(8)?),
        updated_at: parse_datetime(row.get::<_, String>(9)?),
    })
}

fn load_profiles(conn: &Connection, contributor_id: Uuid) -> Result<Vec<Profile>> {
    query_profiles(
        conn,
        "SELECT p.id, p.name FROM profiles p
         JOIN contributor_profiles cp ON cp.profile_id = p.id
         WHERE cp.contributor_id = ? ORDER BY p.name",
        contributor_id,
    )
}

fn load_project_profiles(conn: &Connection, project_id: Uuid) -> Result<Vec<Profile>> {
    query_profiles(
        conn,
        "SELECT p.id, p.name FROM profiles p
         JOIN project_required_profiles pp ON pp.profile_id = p.id
         WHERE pp.project_id = ? ORDER BY p.name",
        project_id,
    )
}

fn query_profiles(conn: &Connection, sql: &str, owner_id: Uuid) -> Result<Vec<Profile>> {
    let mut stmt = conn.prepare(sql)?;
    let profiles = stmt
        .query_map([owner_id.to_string()], |row| {
            Ok(Profile {
                id: parse_uuid(row.get::<_, String>(0)?),
                name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(profiles)
}

fn load_profile(conn: &Connection, id: Uuid) -> Result<Option<Profile>> {
    let mut stmt = conn.prepare("SELECT id, name FROM profiles WHERE id = ?")?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        Ok(Some(Profile {
            id: parse_uuid(row.get::<_, String>(0)?),
            name: row.get(1)?,
        }))
    } else {
        Ok(None)
    }
}

fn with_profiles(conn: &Connection, contributors: Vec<Contributor>) -> Result<Vec<Contributor>> {
    contributors
        .into_iter()
        .map(|mut contributor| {
            contributor.profiles = load_profiles(conn, contributor.id)?;
            Ok(contributor)
        })
        .collect()
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(s: String) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
