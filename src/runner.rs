use assert_json_diff::{assert_json_matches_no_panic, CompareMode, Config, NumericMode};
use bytes::Bytes;
use http::{Request, Response};
use serde::Serialize;
use serde_json::Value;

use crate::report::{Reporter, Tally};
use crate::test_case::TestCase;

/// The request handler under test.
pub trait Handler {
    fn serve(&self, request: Request<Bytes>) -> Response<Bytes>;
}

impl<F> Handler for F
where
    F: Fn(Request<Bytes>) -> Response<Bytes>,
{
    fn serve(&self, request: Request<Bytes>) -> Response<Bytes> {
        self(request)
    }
}

/// What the handler answered. Zero status and empty body when nothing was dispatched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recorded {
    pub status: u16,
    pub body: Bytes,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Check the status code only; the body is left to the caller.
    StatusOnly,
    /// Check the status code and compare the body as JSON.
    #[default]
    Full,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl Summary {
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }
}

/// Dispatches `case` to `handler` and checks only the status code.
///
/// The observed body is returned unchecked, for responses carrying values such as
/// timestamps or generated ids that need custom assertions. Use [`run_case`] when
/// the whole body is deterministic.
///
/// `context` is attached to the request extensions, where the handler can pick it up
/// with `request.extensions().get::<C>()`.
pub fn run_check_status_code<H, C, R>(case: &TestCase, handler: &H, context: &C, reporter: &mut R) -> Recorded
where
    H: Handler + ?Sized,
    C: Clone + Send + Sync + 'static,
    R: Reporter + ?Sized,
{
    if case.skip {
        reporter.log(format!("Skipped test case: {}", case.name));
        return Recorded::default();
    }

    dispatch(case, handler, context, reporter).unwrap_or_default()
}

/// Like [`run_check_status_code`], then compares the observed body against
/// `want_response_body`.
///
/// Bodies are compared as JSON: object key order does not matter, but both sides must
/// carry the same keys with values of the same type.
pub fn run_case<H, C, R>(case: &TestCase, handler: &H, context: &C, reporter: &mut R)
where
    H: Handler + ?Sized,
    C: Clone + Send + Sync + 'static,
    R: Reporter + ?Sized,
{
    if case.skip {
        reporter.log(format!("Skipped test case: {}", case.name));
        return;
    }

    if let Some(recorded) = dispatch(case, handler, context, reporter) {
        check_body(case, &recorded.body, reporter);
    }
}

/// Runs every case in order. A case counts as failed when it reported at least one failure.
pub fn run_suite<H, C, R>(cases: &[TestCase], handler: &H, context: &C, mode: Mode, reporter: &mut R) -> Summary
where
    H: Handler + ?Sized,
    C: Clone + Send + Sync + 'static,
    R: Reporter + ?Sized,
{
    let mut summary = Summary::default();

    for case in cases {
        let mut tally = Tally::new(&mut *reporter);
        match mode {
            Mode::StatusOnly => {
                run_check_status_code(case, handler, context, &mut tally);
            }
            Mode::Full => run_case(case, handler, context, &mut tally),
        }

        if case.skip {
            summary.skipped += 1;
        } else if tally.failures == 0 {
            summary.passed += 1;
        } else {
            summary.failed += 1;
        }
    }

    log::info!(
        "{} passed, {} failed, {} skipped",
        summary.passed,
        summary.failed,
        summary.skipped
    );
    summary
}

/// Structural JSON equality, returning a description of the differences otherwise.
pub fn json_matches(got: &Value, want: &Value) -> Result<(), String> {
    let config = Config::new(CompareMode::Strict).numeric_mode(NumericMode::AssumeFloat);
    assert_json_matches_no_panic(got, want, config)
}

fn dispatch<H, C, R>(case: &TestCase, handler: &H, context: &C, reporter: &mut R) -> Option<Recorded>
where
    H: Handler + ?Sized,
    C: Clone + Send + Sync + 'static,
    R: Reporter + ?Sized,
{
    let request = Request::builder()
        .method(case.http_verb.as_str())
        .uri(case.uri.as_str())
        .extension(context.clone())
        .body(Bytes::from(case.request_body.clone()));

    let request = match request {
        Ok(request) => request,
        Err(err) => {
            reporter.fail(format!(
                "{}: could not build request {} {}: {err}",
                case.name, case.http_verb, case.uri
            ));
            return None;
        }
    };

    let response = handler.serve(request);
    let recorded = Recorded {
        status: response.status().as_u16(),
        body: response.into_body(),
    };
    log::debug!("{} {} -> {}", case.http_verb, case.uri, recorded.status);

    if recorded.status != case.want_status_code {
        reporter.fail(format!(
            "{}: Status Code: wanted {} but got {}",
            case.name, case.want_status_code, recorded.status
        ));
    }

    Some(recorded)
}

fn check_body<R: Reporter + ?Sized>(case: &TestCase, body: &[u8], reporter: &mut R) {
    let got_text = String::from_utf8_lossy(body);

    let got = serde_json::from_slice::<Value>(body).map_err(|err| {
        reporter.fail(format!(
            "{}: Got Response Body invalid format:\n{got_text}\n{err}",
            case.name
        ))
    });
    let want = serde_json::from_str::<Value>(&case.want_response_body).map_err(|err| {
        reporter.fail(format!(
            "{}: Want Response Body invalid format:\n{}\n{err}",
            case.name, case.want_response_body
        ))
    });

    if let (Ok(got), Ok(want)) = (got, want) {
        if let Err(diff) = json_matches(&got, &want) {
            reporter.fail(format!(
                "{}: Response Body: wanted {} but got {got_text}\n{diff}",
                case.name, case.want_response_body
            ));
        }
    }
}
