//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::{
    AppState, Storage,
    auth::{auth_guard, get_current_user, post_log_in, post_log_out, register_user},
    endpoints,
    expense::{
        create_expense_endpoint, delete_expense_endpoint, export_expenses_endpoint,
        get_expense_endpoint, get_report_endpoint, list_expenses_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router<S>(state: AppState<S>) -> Router
where
    S: Storage,
{
    let unprotected_routes = Router::new()
        .route(endpoints::REGISTER, post(register_user::<S>))
        .route(endpoints::LOG_IN, post(post_log_in::<S>))
        .route(endpoints::LOG_OUT, post(post_log_out));

    let protected_routes = Router::new()
        .route(
            endpoints::EXPENSES,
            get(list_expenses_endpoint::<S>).post(create_expense_endpoint::<S>),
        )
        .route(
            endpoints::EXPENSE,
            get(get_expense_endpoint::<S>).delete(delete_expense_endpoint::<S>),
        )
        .route(endpoints::EXPORT_EXPENSES, get(export_expenses_endpoint::<S>))
        .route(endpoints::REPORT, get(get_report_endpoint::<S>))
        .route(endpoints::CURRENT_USER, get(get_current_user))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_guard::<S>,
        ));

    protected_routes.merge(unprotected_routes).with_state(state)
}
