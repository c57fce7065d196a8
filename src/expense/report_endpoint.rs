use axum::{
    Extension,
    extract::State,
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use time::OffsetDateTime;

use crate::{Error, ExpenseReport, Storage, User, expense::ExpenseState, render_pdf};

/// The file name suggested to the client for downloaded reports.
pub const REPORT_FILE_NAME: &str = "expense-report.pdf";

/// A route handler that renders the logged in user's expenses as a PDF report.
///
/// Responds with 500 if no report fonts are configured or the fonts cannot
/// be loaded.
pub async fn get_report_endpoint<S>(
    State(state): State<ExpenseState<S>>,
    Extension(user): Extension<User>,
) -> Result<Response, Error>
where
    S: Storage,
{
    let fonts = state
        .report_fonts
        .as_ref()
        .ok_or_else(|| Error::ReportError("no fonts are configured for reports".to_owned()))?;

    let expenses = state.storage.get_expenses(user.id)?;
    let report = ExpenseReport::new(&expenses, OffsetDateTime::now_utc());
    let pdf = render_pdf(&report, fonts)?;
    tracing::debug!(
        "Rendered a {} byte report with {} rows for user {}",
        pdf.len(),
        report.row_count(),
        user.id
    );

    Ok((
        [
            (CONTENT_TYPE, "application/pdf".to_owned()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{REPORT_FILE_NAME}\""),
            ),
        ],
        pdf,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use axum::http::{
        StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    };
    use axum_test::TestServer;

    use crate::{
        AppState, INTERNAL_ERROR_MESSAGE, MemoryStorage, ReportFonts, build_router, endpoints,
        test_utils::{
            count_pdf_pages, create_expense_as, log_in_as, new_test_server, test_app_state,
            test_fonts,
        },
    };

    fn server_with_fonts(fonts: ReportFonts) -> TestServer {
        let state: AppState<MemoryStorage> =
            test_app_state(MemoryStorage::new()).with_report_fonts(fonts);

        TestServer::new(build_router(state)).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn report_requires_log_in() {
        let server = new_test_server();

        server
            .get(endpoints::REPORT)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn report_is_pdf_attachment() {
        let server = server_with_fonts(test_fonts());
        let token = log_in_as(&server, "alice").await;
        create_expense_as(&server, &token, 12.5, "Groceries").await;
        create_expense_as(&server, &token, 3.0, "Coffee").await;

        let response = server.get(endpoints::REPORT).add_cookie(token).await;

        response.assert_status_ok();
        response.assert_header(CONTENT_TYPE, "application/pdf");
        response.assert_header(
            CONTENT_DISPOSITION,
            "attachment; filename=\"expense-report.pdf\"",
        );
        let pdf = response.as_bytes();
        assert!(pdf.starts_with(b"%PDF"));
        assert_eq!(count_pdf_pages(pdf), 1);
    }

    #[tokio::test]
    async fn report_without_fonts_is_internal_error() {
        let server = new_test_server();
        let token = log_in_as(&server, "alice").await;

        let response = server.get(endpoints::REPORT).add_cookie(token).await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.json::<serde_json::Value>()["message"],
            INTERNAL_ERROR_MESSAGE
        );
    }

    #[tokio::test]
    async fn report_with_missing_fonts_is_internal_error() {
        let server = server_with_fonts(ReportFonts::new("/no/such/fonts", "LiberationSans"));
        let token = log_in_as(&server, "alice").await;

        server
            .get(endpoints::REPORT)
            .add_cookie(token)
            .await
            .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    }
}
