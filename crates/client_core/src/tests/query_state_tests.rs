use super::*;

const WINDOW: Duration = Duration::from_millis(1000);

fn store() -> QueryStateStore {
    QueryStateStore::new(WINDOW, PageSize::Ten)
}

async fn advance(ms: u64) {
    tokio::time::advance(Duration::from_millis(ms)).await;
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn initial_params_match_first_load_request() {
    let store = store();
    let params = store.derive_params();

    assert_eq!(params.page, 1);
    assert_eq!(params.per_page, PageSize::Ten);
    assert_eq!(params.sort_by, SortField::EmployeeId);
    assert_eq!(params.sort_order, SortOrder::Asc);
    assert_eq!(
        params.query_string(),
        "department=&salary_min=&salary_max=&sort_by=employee_id&sort_order=ASC&page=1&per_page=10"
    );
}

#[tokio::test]
async fn derive_params_is_idempotent() {
    let mut store = store();
    store
        .set_filter(FilterField::Department, "Research & Development")
        .expect("department");
    store.set_sort(SortField::Salary);
    store.set_page(2);

    let first = store.derive_params();
    let second = store.derive_params();
    assert_eq!(first, second);
    assert_eq!(first.query_pairs(), second.query_pairs());
    assert_eq!(
        first.query_string(),
        "department=Research+%26+Development&salary_min=&salary_max=&sort_by=salary&sort_order=ASC&page=3&per_page=10"
    );
}

#[tokio::test]
async fn department_change_resets_page() {
    let mut store = store();
    store.set_page(3);
    assert_eq!(store.derive_params().page, 4);

    store
        .set_filter(FilterField::Department, "Sales")
        .expect("department");

    let params = store.derive_params();
    assert_eq!(params.page, 1);
    assert_eq!(params.department, "Sales");
    assert_eq!(store.page().page_index, 0);
}

#[tokio::test]
async fn sort_clicks_toggle_direction_and_reset_page() {
    let mut store = store();
    store.set_page(5);

    store.set_sort(SortField::EmployeeId);
    assert_eq!(
        store.sort(),
        SortState {
            field: SortField::EmployeeId,
            direction: SortOrder::Desc
        }
    );
    assert_eq!(store.page().page_index, 0);

    store.set_page(2);
    store.set_sort(SortField::LastName);
    assert_eq!(
        store.sort(),
        SortState {
            field: SortField::LastName,
            direction: SortOrder::Asc
        }
    );
    assert_eq!(store.page().page_index, 0);

    store.set_sort(SortField::LastName);
    assert_eq!(store.sort().direction, SortOrder::Desc);
}

#[tokio::test]
async fn page_size_change_resets_page() {
    let mut store = store();
    store.set_page(4);
    store.set_page_size(PageSize::Fifty);

    let params = store.derive_params();
    assert_eq!(params.page, 1);
    assert_eq!(params.per_page, PageSize::Fifty);
}

#[tokio::test(start_paused = true)]
async fn salary_edits_never_reset_page() {
    let mut store = store();
    store.set_page(3);

    store
        .set_filter(FilterField::SalaryMin, "1000")
        .expect("salary");
    store
        .set_filter(FilterField::SalaryMax, "5000")
        .expect("salary");
    advance(1000).await;

    let params = store.derive_params();
    assert_eq!(params.salary_min, Some(1000.0));
    assert_eq!(params.salary_max, Some(5000.0));
    assert_eq!(params.page, 4);
}

#[tokio::test(start_paused = true)]
async fn salary_commits_only_after_debounce_window() {
    let mut store = store();

    store
        .set_filter(FilterField::SalaryMin, "1000")
        .expect("salary");
    advance(200).await;
    store
        .set_filter(FilterField::SalaryMin, "10000")
        .expect("salary");

    assert_eq!(store.draft().salary_min, Some(10000.0));
    assert_eq!(store.derive_params().salary_min, None);
    assert!(store.has_pending_input());

    advance(999).await;
    assert_eq!(store.derive_params().salary_min, None);

    advance(1).await;
    assert_eq!(store.derive_params().salary_min, Some(10000.0));
    assert!(!store.has_pending_input());
    assert!(store
        .derive_params()
        .query_string()
        .contains("salary_min=10000&"));
}

#[tokio::test(start_paused = true)]
async fn salary_max_is_clamped_to_salary_min() {
    let mut store = store();
    store
        .set_filter(FilterField::SalaryMin, "3000")
        .expect("salary");
    store
        .set_filter(FilterField::SalaryMax, "1500")
        .expect("salary");

    assert_eq!(store.draft().salary_max, Some(3000.0));
    advance(1000).await;
    assert_eq!(store.derive_params().salary_max, Some(3000.0));
}

#[tokio::test(start_paused = true)]
async fn raising_salary_min_drags_salary_max_along() {
    let mut store = store();
    store
        .set_filter(FilterField::SalaryMax, "2000")
        .expect("salary");
    advance(1000).await;

    store
        .set_filter(FilterField::SalaryMin, "2500")
        .expect("salary");
    assert_eq!(store.draft().salary_max, Some(2500.0));

    advance(1000).await;
    let params = store.derive_params();
    assert_eq!(params.salary_min, Some(2500.0));
    assert_eq!(params.salary_max, Some(2500.0));
}

#[tokio::test(start_paused = true)]
async fn committed_salary_range_stays_ordered_across_interleaved_edits() {
    let mut store = store();
    store
        .set_filter(FilterField::SalaryMax, "2000")
        .expect("salary");
    advance(1000).await;
    assert_eq!(store.derive_params().salary_max, Some(2000.0));

    store
        .set_filter(FilterField::SalaryMin, "3000")
        .expect("salary");
    advance(500).await;
    store
        .set_filter(FilterField::SalaryMax, "4000")
        .expect("salary");
    advance(500).await;

    let params = store.derive_params();
    assert_eq!(params.salary_min, None);
    assert_eq!(params.salary_max, Some(2000.0));

    advance(500).await;
    let params = store.derive_params();
    assert_eq!(params.salary_min, Some(3000.0));
    assert_eq!(params.salary_max, Some(4000.0));
    assert!(params
        .query_string()
        .contains("salary_min=3000&salary_max=4000&"));
}

#[tokio::test]
async fn salary_input_boundary_rules() {
    assert_eq!(parse_salary(""), Ok(None));
    assert_eq!(parse_salary("  "), Ok(None));
    assert_eq!(parse_salary("1200.50"), Ok(Some(1200.5)));
    assert_eq!(parse_salary("-40"), Ok(Some(0.0)));
    assert!(parse_salary("NaN").is_err());
    assert!(parse_salary("12k").is_err());

    let mut store = store();
    let err = store
        .set_filter(FilterField::SalaryMin, "lots")
        .expect_err("not a number");
    assert_eq!(err, QueryStateError::InvalidSalary("lots".into()));
    assert_eq!(store.draft().salary_min, None);
    assert!(!store.has_pending_input());
}

#[tokio::test(start_paused = true)]
async fn clearing_a_salary_field_removes_the_bound() {
    let mut store = store();
    store
        .set_filter(FilterField::SalaryMin, "900")
        .expect("salary");
    advance(1000).await;
    store.set_filter(FilterField::SalaryMin, "").expect("salary");
    advance(1000).await;

    assert_eq!(store.derive_params().salary_min, None);
    assert!(store.derive_params().query_string().contains("salary_min=&"));
}

#[tokio::test(start_paused = true)]
async fn cancel_pending_drops_unsettled_edits() {
    let mut store = store();
    store
        .set_filter(FilterField::SalaryMin, "700")
        .expect("salary");
    store.cancel_pending();
    advance(5000).await;

    assert_eq!(store.derive_params().salary_min, None);
}

#[tokio::test]
async fn export_params_snapshot_filters_sort_and_mode() {
    let mut store = store();
    store
        .set_filter(FilterField::Department, "Sales")
        .expect("department");
    store.set_sort(SortField::HireDate);
    store.set_sort(SortField::HireDate);
    store.set_page(7);
    store.set_export_mode(ExportMode::All);

    let params = store.export_params();
    assert_eq!(
        params.query_pairs(),
        vec![
            ("department", "Sales".to_string()),
            ("salary_min", String::new()),
            ("salary_max", String::new()),
            ("sort_by", "hire_date".to_string()),
            ("sort_order", "DESC".to_string()),
            ("export_type", "all".to_string()),
        ]
    );
}

#[tokio::test]
async fn export_mode_has_no_reset_side_effects() {
    let mut store = store();
    store.set_page(2);
    let before = store.derive_params();

    store.set_export_mode(ExportMode::All);
    assert_eq!(store.export_mode(), ExportMode::All);
    assert_eq!(store.derive_params(), before);
}

#[tokio::test(start_paused = true)]
async fn subscription_yields_distinct_values_only() {
    let mut store = store();
    let mut subscription = store.subscribe();

    let first = subscription.next().await.expect("initial");
    assert_eq!(first.page, 1);

    // Same page again does not notify.
    store.set_page(0);
    store.set_page(1);
    let second = subscription.next().await.expect("page change");
    assert_eq!(second.page, 2);

    // Back to a value equal to the last yielded one produces nothing new.
    store.set_page(0);
    store.set_page(1);
    store.set_sort(SortField::Email);
    let third = subscription.next().await.expect("sort change");
    assert_eq!(third.sort_by, SortField::Email);
    assert_eq!(third.page, 1);
}

#[tokio::test(start_paused = true)]
async fn subscription_sees_debounced_value_once() {
    let mut store = store();
    let mut subscription = store.subscribe();
    subscription.next().await.expect("initial");
    let started = tokio::time::Instant::now();

    store
        .set_filter(FilterField::SalaryMin, "1000")
        .expect("salary");
    advance(200).await;
    store
        .set_filter(FilterField::SalaryMin, "10000")
        .expect("salary");

    let settled = subscription.next().await.expect("settled");
    assert_eq!(settled.salary_min, Some(10000.0));
    assert!(started.elapsed() >= Duration::from_millis(1200));
}

#[tokio::test]
async fn subscription_ends_when_store_is_dropped() {
    let store = store();
    let mut subscription = store.subscribe();
    subscription.next().await.expect("initial");

    drop(store);
    assert!(subscription.next().await.is_none());
}
