use chrono::NaiveDate;
use speculate2::speculate;
use staffing_engine::db::Database;
use staffing_engine::engine::*;
use staffing_engine::models::*;
use staffing_engine::store::StaffingStore;
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn create_project(db: &Database, name: &str, start_date: Option<NaiveDate>) -> Project {
    db.create_project(CreateProjectInput {
        name: name.to_string(),
        status: None,
        is_internal: false,
        client_id: None,
        required_profile_ids: vec![],
        start_date,
        end_date: None,
    })
    .expect("Failed to create project")
}

/// Active contributor carrying `profile`, under contract since 2024.
fn hire(db: &Database, first_name: &str, profile: &Profile, weekly_hours: f64) -> Contributor {
    let contributor = db
        .create_contributor(CreateContributorInput {
            first_name: first_name.to_string(),
            last_name: "Tester".to_string(),
            email: None,
            profile_ids: vec![profile.id],
        })
        .expect("Failed to create contributor");

    db.create_employment_period(CreateEmploymentPeriodInput {
        contributor_id: contributor.id,
        start_date: date(2024, 1, 1),
        end_date: None,
        weekly_hours,
        work_time_percentage: 100.0,
        daily_rate: None,
    })
    .expect("Failed to create employment period");

    contributor
}

fn task_input(name: &str, profile: Option<&Profile>, hours: f64) -> CreateTaskInput {
    CreateTaskInput {
        name: name.to_string(),
        status: None,
        active: true,
        counts_for_profitability: true,
        task_type: None,
        required_profile_id: profile.map(|p| p.id),
        assigned_contributor_id: None,
        estimated_hours_sold: Some(hours),
        estimated_hours_revised: None,
        position: None,
    }
}

fn allocate(db: &Database, contributor: &Contributor, project: &Project, daily_hours: f64) {
    db.create_planning(CreatePlanningInput {
        contributor_id: contributor.id,
        project_id: project.id,
        start_date: date(2025, 1, 6),
        end_date: date(2025, 1, 10),
        daily_hours,
        status: Some(PlanningStatus::Confirmed),
        notes: None,
    })
    .expect("Failed to create planning");
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
        let clock = FixedClock(date(2025, 1, 8));
        let developer = db.create_profile("Developer").expect("Failed to create profile");
        let monday = date(2025, 1, 6);
        let project = create_project(&db, "Storefront", Some(monday));
        let other = create_project(&db, "Back Office", None);
    }

    describe "generate_suggestions" {
        it "plans a three day task from monday to wednesday" {
            let ada = hire(&db, "Ada", &developer, 35.0);
            db.create_task(project.id, task_input("Checkout", Some(&developer), 21.0))
                .expect("Failed to create task");

            let report = TaskAssignmentAssistant::new(&db, &clock)
                .generate_suggestions(&project, None)
                .expect("Failed to suggest");

            assert_eq!(report.suggestions.len(), 1);
            let suggestion = &report.suggestions[0];
            assert_eq!(suggestion.contributor.id, ada.id);
            assert_eq!(suggestion.start_date, monday);
            assert_eq!(suggestion.end_date, date(2025, 1, 8));
            assert_eq!(suggestion.daily_hours, 7.0);
            assert_eq!(suggestion.score, 70.0);
            assert_eq!(suggestion.confidence, 0.7);
            assert_eq!(suggestion.reasoning, "Availability: 100%");
            assert!(suggestion.warnings.is_empty());
        }

        it "skips weekends when computing the end date" {
            hire(&db, "Ada", &developer, 35.0);
            db.create_task(project.id, task_input("Checkout", Some(&developer), 21.0))
                .expect("Failed to create task");

            let report = TaskAssignmentAssistant::new(&db, &clock)
                .generate_suggestions(&project, Some(date(2025, 1, 9)))
                .expect("Failed to suggest");

            assert_eq!(report.suggestions[0].end_date, date(2025, 1, 13));
        }

        it "prefers the less loaded candidate" {
            let busy = hire(&db, "Busy", &developer, 35.0);
            let free = hire(&db, "Free", &developer, 35.0);
            allocate(&db, &busy, &other, 3.5);
            db.create_task(project.id, task_input("Checkout", Some(&developer), 21.0))
                .expect("Failed to create task");

            let report = TaskAssignmentAssistant::new(&db, &clock)
                .generate_suggestions(&project, None)
                .expect("Failed to suggest");

            assert_eq!(report.suggestions[0].contributor.id, free.id);
        }

        it "leaves tasks without a qualified contributor unassigned" {
            let designer = db.create_profile("Designer").expect("Failed to create profile");
            hire(&db, "Ada", &developer, 35.0);
            db.create_task(project.id, task_input("Checkout", Some(&developer), 14.0))
                .expect("Failed to create task");
            db.create_task(project.id, task_input("Mockups", Some(&designer), 14.0))
                .expect("Failed to create task");
            db.create_task(project.id, task_input("Unestimated", Some(&developer), 0.0))
                .expect("Failed to create task");

            let report = TaskAssignmentAssistant::new(&db, &clock)
                .generate_suggestions(&project, None)
                .expect("Failed to suggest");

            let unassigned: Vec<&str> = report.unassigned.iter().map(|t| t.name.as_str()).collect();
            assert_eq!(unassigned, vec!["Mockups", "Unestimated"]);
            assert_eq!(report.statistics, AssignmentStatistics {
                total_tasks: 3,
                assigned_tasks: 1,
                unassigned_tasks: 2,
                average_confidence: 0.7,
            });
        }

        it "leaves a task whose estimate runs past the calendar unassigned" {
            let ada = hire(&db, "Ada", &developer, 35.0);
            db.create_task(project.id, task_input("Rewrite Everything", Some(&developer), 1e9))
                .expect("Failed to create task");
            db.create_task(project.id, task_input("Checkout", Some(&developer), 21.0))
                .expect("Failed to create task");

            let report = TaskAssignmentAssistant::new(&db, &clock)
                .generate_suggestions(&project, None)
                .expect("Failed to suggest");

            assert_eq!(report.suggestions.len(), 1);
            assert_eq!(report.suggestions[0].contributor.id, ada.id);
            assert_eq!(report.unassigned.len(), 1);
            assert_eq!(report.unassigned[0].name, "Rewrite Everything");
        }

        it "only considers tasks that still need staffing" {
            hire(&db, "Ada", &developer, 35.0);
            db.create_task(project.id, CreateTaskInput {
                status: Some(TaskStatus::Completed),
                ..task_input("Done", Some(&developer), 7.0)
            }).expect("Failed to create task");
            db.create_task(project.id, CreateTaskInput {
                active: false,
                ..task_input("Inactive", Some(&developer), 7.0)
            }).expect("Failed to create task");
            db.create_task(project.id, CreateTaskInput {
                counts_for_profitability: false,
                ..task_input("Internal", Some(&developer), 7.0)
            }).expect("Failed to create task");
            db.create_task(project.id, task_input("Anyone", None, 7.0))
                .expect("Failed to create task");

            let report = TaskAssignmentAssistant::new(&db, &clock)
                .generate_suggestions(&project, None)
                .expect("Failed to suggest");

            assert!(report.suggestions.is_empty());
            assert!(report.unassigned.is_empty());
            assert_eq!(report.statistics, AssignmentStatistics::default());
        }

        it "sorts suggestions by confidence" {
            let ada = hire(&db, "Ada", &developer, 35.0);
            allocate(&db, &ada, &other, 3.5);
            let tester = db.create_profile("Tester").expect("Failed to create profile");
            let tom = hire(&db, "Tom", &tester, 35.0);

            db.create_task(project.id, task_input("Checkout", Some(&developer), 7.0))
                .expect("Failed to create task");
            db.create_task(project.id, task_input("QA", Some(&tester), 7.0))
                .expect("Failed to create task");

            let report = TaskAssignmentAssistant::new(&db, &clock)
                .generate_suggestions(&project, None)
                .expect("Failed to suggest");

            let order: Vec<Uuid> = report.suggestions.iter().map(|s| s.contributor.id).collect();
            assert_eq!(order, vec![tom.id, ada.id]);
            assert_eq!(report.statistics.average_confidence, 0.53);
        }

        it "defaults to next monday when the project has no start date" {
            hire(&db, "Ada", &developer, 35.0);
            db.create_task(other.id, task_input("Reports", Some(&developer), 7.0))
                .expect("Failed to create task");

            let report = TaskAssignmentAssistant::new(&db, &clock)
                .generate_suggestions(&other, None)
                .expect("Failed to suggest");

            assert_eq!(report.suggestions[0].start_date, date(2025, 1, 13));
            assert_eq!(report.suggestions[0].end_date, date(2025, 1, 13));
        }
    }

    describe "suggest_assignment" {
        it "rewards project history and an existing assignment" {
            let ada = hire(&db, "Ada", &developer, 35.0);
            let bob = hire(&db, "Bob", &developer, 35.0);
            db.create_planning(CreatePlanningInput {
                contributor_id: ada.id,
                project_id: project.id,
                start_date: date(2024, 3, 4),
                end_date: date(2024, 3, 8),
                daily_hours: 7.0,
                status: Some(PlanningStatus::Cancelled),
                notes: None,
            }).expect("Failed to create planning");

            let task = db.create_task(project.id, CreateTaskInput {
                assigned_contributor_id: Some(bob.id),
                ..task_input("Checkout", Some(&developer), 7.0)
            }).expect("Failed to create task");

            let suggestion = TaskAssignmentAssistant::new(&db, &clock)
                .suggest_assignment(&task, &project, monday)
                .expect("Failed to suggest")
                .expect("No suggestion");

            assert_eq!(suggestion.contributor.id, bob.id);
            assert_eq!(suggestion.score, 90.0);
            assert_eq!(suggestion.confidence, 0.9);
            assert_eq!(suggestion.reasoning, "Availability: 100%, Already assigned to this task");

            let ada_score = score_candidate(
                &TaskAssignmentAssistant::new(&db, &clock)
                    .evaluate_availability(ada.clone(), monday, monday)
                    .expect("Failed to evaluate")
                    .expect("Ada unavailable"),
                true,
                false,
            );
            assert_eq!(ada_score.total, 80.0);
        }

        it "warns about a high current load" {
            let ada = hire(&db, "Ada", &developer, 50.0);
            allocate(&db, &ada, &other, 6.5);
            let task = db.create_task(project.id, task_input("Checkout", Some(&developer), 7.0))
                .expect("Failed to create task");

            let suggestion = TaskAssignmentAssistant::new(&db, &clock)
                .suggest_assignment(&task, &project, monday)
                .expect("Failed to suggest")
                .expect("No suggestion");

            assert_eq!(suggestion.warnings, vec!["High current load: 6.5h/day".to_string()]);
            assert!((suggestion.daily_hours - 3.5).abs() < 1e-9);
        }
    }

    describe "evaluate_availability" {
        it "derives availability from contract and load" {
            let ada = hire(&db, "Ada", &developer, 35.0);
            allocate(&db, &ada, &other, 3.5);

            let candidate = TaskAssignmentAssistant::new(&db, &clock)
                .evaluate_availability(ada, monday, date(2025, 1, 10))
                .expect("Failed to evaluate")
                .expect("Candidate rejected");

            assert_eq!(candidate.contract_daily_hours, 7.0);
            assert_eq!(candidate.current_load, 3.5);
            assert_eq!(candidate.availability, 0.5);
            assert_eq!(candidate.daily_hours, 3.5);
            assert!(!candidate.on_vacation);
        }

        it "averages load over business days only" {
            let ada = hire(&db, "Ada", &developer, 35.0);
            allocate(&db, &ada, &other, 7.0);

            let load = TaskAssignmentAssistant::new(&db, &clock)
                .current_load(&ada, monday, date(2025, 1, 19))
                .expect("Failed to compute load");

            assert_eq!(load, 3.5);
        }

        it "ignores cancelled plannings" {
            let ada = hire(&db, "Ada", &developer, 35.0);
            db.create_planning(CreatePlanningInput {
                contributor_id: ada.id,
                project_id: other.id,
                start_date: monday,
                end_date: date(2025, 1, 10),
                daily_hours: 7.0,
                status: Some(PlanningStatus::Cancelled),
                notes: None,
            }).expect("Failed to create planning");

            let load = TaskAssignmentAssistant::new(&db, &clock)
                .current_load(&ada, monday, date(2025, 1, 10))
                .expect("Failed to compute load");

            assert_eq!(load, 0.0);
        }

        it "halves availability on an approved vacation" {
            let ada = hire(&db, "Ada", &developer, 35.0);
            db.create_vacation(CreateVacationInput {
                contributor_id: ada.id,
                start_date: date(2025, 1, 7),
                end_date: date(2025, 1, 7),
                kind: VacationKind::PaidLeave,
                status: VacationStatus::Approved,
            }).expect("Failed to create vacation");

            let candidate = TaskAssignmentAssistant::new(&db, &clock)
                .evaluate_availability(ada, monday, date(2025, 1, 8))
                .expect("Failed to evaluate")
                .expect("Candidate rejected");

            assert!(candidate.on_vacation);
            assert_eq!(candidate.availability, 0.5);
            assert_eq!(candidate.daily_hours, 3.5);
        }

        it "ignores vacations that are not approved" {
            let ada = hire(&db, "Ada", &developer, 35.0);
            db.create_vacation(CreateVacationInput {
                contributor_id: ada.id,
                start_date: date(2025, 1, 7),
                end_date: date(2025, 1, 7),
                kind: VacationKind::PaidLeave,
                status: VacationStatus::Pending,
            }).expect("Failed to create vacation");

            let candidate = TaskAssignmentAssistant::new(&db, &clock)
                .evaluate_availability(ada, monday, date(2025, 1, 8))
                .expect("Failed to evaluate")
                .expect("Candidate rejected");

            assert_eq!(candidate.availability, 1.0);
        }

        it "rejects candidates below the availability floor" {
            let ada = hire(&db, "Ada", &developer, 35.0);
            allocate(&db, &ada, &other, 6.0);

            let candidate = TaskAssignmentAssistant::new(&db, &clock)
                .evaluate_availability(ada, monday, date(2025, 1, 10))
                .expect("Failed to evaluate");

            assert!(candidate.is_none());
        }

        it "rejects candidates without an active contract" {
            let ada = db.create_contributor(CreateContributorInput {
                first_name: "Ada".to_string(),
                last_name: "Tester".to_string(),
                email: None,
                profile_ids: vec![developer.id],
            }).expect("Failed to create contributor");
            db.create_employment_period(CreateEmploymentPeriodInput {
                contributor_id: ada.id,
                start_date: date(2025, 2, 1),
                end_date: None,
                weekly_hours: 35.0,
                work_time_percentage: 100.0,
                daily_rate: None,
            }).expect("Failed to create employment period");

            let candidate = TaskAssignmentAssistant::new(&db, &clock)
                .evaluate_availability(ada, monday, date(2025, 1, 10))
                .expect("Failed to evaluate");

            assert!(candidate.is_none());
        }

        it "scales contract hours by the part time factor" {
            let ada = db.create_contributor(CreateContributorInput {
                first_name: "Ada".to_string(),
                last_name: "Tester".to_string(),
                email: None,
                profile_ids: vec![developer.id],
            }).expect("Failed to create contributor");
            db.create_employment_period(CreateEmploymentPeriodInput {
                contributor_id: ada.id,
                start_date: date(2024, 1, 1),
                end_date: Some(date(2025, 12, 31)),
                weekly_hours: 35.0,
                work_time_percentage: 80.0,
                daily_rate: Some(450.0),
            }).expect("Failed to create employment period");

            let candidate = TaskAssignmentAssistant::new(&db, &clock)
                .evaluate_availability(ada, monday, date(2025, 1, 10))
                .expect("Failed to evaluate")
                .expect("Candidate rejected");

            assert!((candidate.contract_daily_hours - 5.6).abs() < 1e-9);
            assert!((candidate.daily_hours - 5.6).abs() < 1e-9);
        }
    }
}
