use axum::{
    Router,
    extract::{Json, Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use crate::core::{
    DebtId, MAX_MONTHS, OverrideStore, PlanSettings, RawDebt, RawValue, Report, ReportDiff,
    Termination, diff, plan,
};
use crate::error::PlannerError;
use crate::expr;
use crate::io::{import_debts, import_debts_value, schedule_to_string};
use crate::store::{
    JsonFileProfileStore, MemoryProfileStore, ProfileDocument, ProfileKey, ProfileStore,
};

pub const PROFILE_DIR_ENV: &str = "DEBT_PLANNER_PROFILE_DIR";

#[derive(Parser, Debug)]
#[command(
    name = "debt-planner plan",
    about = "Avalanche debt payoff schedule (highest interest rate first) with per-month overrides"
)]
struct Cli {
    #[arg(
        long,
        value_name = "PATH",
        help = "Debt list JSON, as written by the debt-list export"
    )]
    debts: Option<PathBuf>,
    #[arg(
        long,
        help = "Monthly budget; arithmetic such as 15000+1000 is accepted [default: 16000]"
    )]
    budget: Option<String>,
    #[arg(
        long,
        help = "Default minimum payment in percent of the balance [default: 5]"
    )]
    min_percent: Option<String>,
    #[arg(
        long = "total",
        value_name = "MONTH=AMOUNT",
        help = "Replace the whole budget for one month"
    )]
    totals: Vec<String>,
    #[arg(
        long = "pay",
        value_name = "MONTH:DEBT_ID=AMOUNT",
        help = "Pay a fixed amount to one debt in one month"
    )]
    payments: Vec<String>,
    #[arg(long, value_name = "PATH", help = "Write the overridden schedule as CSV")]
    csv: Option<PathBuf>,
    #[arg(long, help = "Nickname of a saved profile to load debts and settings from")]
    user: Option<String>,
    #[arg(long, requires = "user", help = "Save debts and settings back to the profile")]
    save: bool,
    #[arg(long, value_name = "DIR", env = PROFILE_DIR_ENV, default_value = "profiles")]
    profile_dir: PathBuf,
}

#[derive(Debug)]
struct PlanRequest {
    debts: Vec<RawDebt>,
    settings: PlanSettings,
    overrides: OverrideStore,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PlanPayload {
    debts: Option<serde_json::Value>,
    budget: Option<RawValue>,
    min_percent: Option<RawValue>,
    overrides: BTreeMap<u32, MonthOverridePayload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MonthOverridePayload {
    total: Option<serde_json::Value>,
    debts: BTreeMap<DebtId, serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanResponse {
    settings: PlanSettings,
    baseline: Report,
    report: Report,
    diff: ReportDiff,
    reason: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanSummary {
    termination: Termination,
    total_months: u32,
    total_interest_accrued: f64,
    baseline_months: u32,
    baseline_interest_accrued: f64,
    months_delta: i64,
    interest_delta: f64,
    reason: Option<String>,
}

impl From<&PlanResponse> for PlanSummary {
    fn from(response: &PlanResponse) -> Self {
        Self {
            termination: response.report.termination,
            total_months: response.report.total_months,
            total_interest_accrued: response.report.total_interest_accrued,
            baseline_months: response.baseline.total_months,
            baseline_interest_accrued: response.baseline.total_interest_accrued,
            months_delta: response.diff.months_delta,
            interest_delta: response.diff.interest_delta,
            reason: response.reason.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Clone)]
struct AppState {
    store: Arc<Mutex<Box<dyn ProfileStore>>>,
}

pub fn run_plan_command<I, T>(args: I) -> Result<String, String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) => {
            return match e.kind() {
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                    Ok(e.to_string())
                }
                _ => Err(e.to_string()),
            };
        }
    };

    let mut profile = match &cli.user {
        Some(nickname) => {
            let key = ProfileKey::anonymous(nickname)
                .ok_or_else(|| "--user must not be empty".to_string())?;
            let mut store = JsonFileProfileStore::new(&cli.profile_dir);
            store.connect().map_err(|e| e.to_string())?;
            let doc = store.load(&key).map_err(|e| e.to_string())?;
            Some((store, key, doc))
        }
        None => None,
    };
    let stored = profile.as_ref().and_then(|(_, _, doc)| doc.as_ref());

    let debts = match (&cli.debts, stored.and_then(|doc| doc.debts.clone())) {
        (Some(path), _) => {
            let raw = fs::read_to_string(path)
                .map_err(|e| format!("reading {}: {e}", path.display()))?;
            import_debts(&raw).map_err(|e| e.to_string())?
        }
        (None, Some(debts)) => debts,
        (None, None) => {
            return Err("--debts is required unless --user names a saved profile".to_string());
        }
    };
    let defaults = stored
        .map(|doc| doc.settings_or(PlanSettings::default()))
        .unwrap_or_default();

    let request = build_request(&cli, debts, defaults)?;
    let response = build_plan_response(&request).map_err(|e| e.to_string())?;

    if let Some((store, key, _)) = profile.as_mut() {
        let saved = if cli.save {
            store
                .save(key, ProfileDocument::snapshot(&request.settings, &request.debts))
                .map(|_| ())
        } else {
            Ok(())
        };
        store.disconnect();
        saved.map_err(|e| e.to_string())?;
    }

    if let Some(path) = &cli.csv {
        let csv = schedule_to_string(&response.report).map_err(|e| e.to_string())?;
        fs::write(path, csv).map_err(|e| format!("writing {}: {e}", path.display()))?;
        return Ok(format!(
            "wrote {} months to {}",
            response.report.total_months,
            path.display()
        ));
    }

    serde_json::to_string_pretty(&PlanSummary::from(&response)).map_err(|e| e.to_string())
}

fn build_request(
    cli: &Cli,
    debts: Vec<RawDebt>,
    defaults: PlanSettings,
) -> Result<PlanRequest, String> {
    let budget = match &cli.budget {
        Some(text) => resolve_amount(text, "--budget")?,
        None => defaults.budget,
    };
    let min_percent = match &cli.min_percent {
        Some(text) => resolve_amount(text, "--min-percent")?,
        None => defaults.min_percent,
    };
    let settings = validate_settings(budget, min_percent, "--budget", "--min-percent")?;

    let mut overrides = OverrideStore::new();
    for arg in &cli.totals {
        let (month, amount) = arg
            .split_once('=')
            .ok_or_else(|| format!("--total expects MONTH=AMOUNT, got '{arg}'"))?;
        let month = parse_month(month, "--total")?;
        if !overrides.set_total(month, cli_override(amount, "--total", month)?) {
            return Err(format!("--total amount for month {month} is not a number"));
        }
    }
    for arg in &cli.payments {
        let (target, amount) = arg
            .split_once('=')
            .ok_or_else(|| format!("--pay expects MONTH:DEBT_ID=AMOUNT, got '{arg}'"))?;
        let (month, id) = target
            .split_once(':')
            .ok_or_else(|| format!("--pay expects MONTH:DEBT_ID=AMOUNT, got '{arg}'"))?;
        let month = parse_month(month, "--pay")?;
        let amount = cli_override(amount, "--pay", month)?;
        if !overrides.set_debt_payment(month, DebtId::from(id.trim()), amount) {
            return Err(format!("--pay amount for month {month} is not a number"));
        }
    }

    Ok(PlanRequest {
        debts,
        settings,
        overrides,
    })
}

fn validate_settings(
    budget: f64,
    min_percent: f64,
    budget_name: &str,
    percent_name: &str,
) -> Result<PlanSettings, String> {
    if !budget.is_finite() || budget < 0.0 {
        return Err(format!("{budget_name} must be >= 0"));
    }
    if !(0.0..=100.0).contains(&min_percent) {
        return Err(format!("{percent_name} must be between 0 and 100"));
    }
    Ok(PlanSettings {
        budget,
        min_percent,
    })
}

fn parse_month(text: &str, flag: &str) -> Result<u32, String> {
    match text.trim().parse::<u32>() {
        Ok(month) if (1..=MAX_MONTHS).contains(&month) => Ok(month),
        _ => Err(format!("{flag} month must be between 1 and {MAX_MONTHS}, got '{text}'")),
    }
}

fn resolve_amount(text: &str, name: &str) -> Result<f64, String> {
    expr::evaluate(text).map_err(|e| format!("{name}: {e}"))
}

fn resolve_override(text: &str) -> RawValue {
    match expr::evaluate(text) {
        Ok(value) => RawValue::Number(value),
        Err(_) => RawValue::Text(text.to_string()),
    }
}

fn cli_override(amount: &str, flag: &str, month: u32) -> Result<RawValue, String> {
    let value = resolve_override(amount);
    match value.parse() {
        Some(v) if v < 0.0 => Err(format!("{flag} amount for month {month} must be >= 0")),
        _ => Ok(value),
    }
}

// Non-scalar values clear the slot.
fn resolve_json_override(value: serde_json::Value) -> RawValue {
    match value {
        serde_json::Value::Number(n) => n.as_f64().map_or_else(
            || RawValue::Text(String::new()),
            RawValue::Number,
        ),
        serde_json::Value::String(text) => resolve_override(&text),
        _ => RawValue::Text(String::new()),
    }
}

fn resolve_raw_amount(raw: &RawValue, name: &str) -> Result<f64, String> {
    match raw {
        RawValue::Number(v) => Ok(*v),
        RawValue::Text(text) => resolve_amount(text, name),
    }
}

fn plan_request_from_payload(payload: PlanPayload) -> Result<PlanRequest, String> {
    let debts = match payload.debts {
        Some(value) => import_debts_value(value).map_err(|e| e.to_string())?,
        None => return Err("debts is required".to_string()),
    };

    let defaults = PlanSettings::default();
    let budget = match &payload.budget {
        Some(raw) => resolve_raw_amount(raw, "budget")?,
        None => defaults.budget,
    };
    let min_percent = match &payload.min_percent {
        Some(raw) => resolve_raw_amount(raw, "minPercent")?,
        None => defaults.min_percent,
    };
    let settings = validate_settings(budget, min_percent, "budget", "minPercent")?;

    let mut overrides = OverrideStore::new();
    for (month, entry) in payload.overrides {
        if month == 0 {
            return Err("override months start at 1".to_string());
        }
        if let Some(total) = entry.total {
            overrides.set_total(month, resolve_json_override(total));
        }
        for (id, amount) in entry.debts {
            overrides.set_debt_payment(month, id, resolve_json_override(amount));
        }
    }

    Ok(PlanRequest {
        debts,
        settings,
        overrides,
    })
}

fn build_plan_response(request: &PlanRequest) -> Result<PlanResponse, PlannerError> {
    let baseline = plan(&request.debts, &request.settings, &OverrideStore::new())?;
    let report = if request.overrides.is_empty() {
        baseline.clone()
    } else {
        plan(&request.debts, &request.settings, &request.overrides)?
    };
    let diff = diff(&baseline, &report, &request.overrides);
    let reason = diff.describe();

    Ok(PlanResponse {
        settings: request.settings,
        baseline,
        report,
        diff,
        reason,
    })
}

pub fn profile_store_from_env() -> Box<dyn ProfileStore> {
    match std::env::var_os(PROFILE_DIR_ENV) {
        Some(dir) => Box::new(JsonFileProfileStore::new(PathBuf::from(dir))),
        None => Box::new(MemoryProfileStore::new()),
    }
}

pub async fn run_http_server(port: u16, mut store: Box<dyn ProfileStore>) -> std::io::Result<()> {
    store
        .connect()
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    let state = AppState {
        store: Arc::new(Mutex::new(store)),
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/api/plan", post(plan_handler))
        .route("/api/schedule.csv", post(schedule_csv_handler))
        .route("/api/debts/import", post(import_handler))
        .route(
            "/api/profile/:kind/:id",
            get(profile_get_handler).put(profile_put_handler),
        )
        .fallback(not_found_handler)
        .with_state(state);

    let listener = TcpListener::bind(addr).await?;
    log::info!("debt planner API listening on http://{addr}");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn plan_handler(Json(payload): Json<PlanPayload>) -> Response {
    match plan_response_from_payload(payload) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(response) => response,
    }
}

async fn schedule_csv_handler(Json(payload): Json<PlanPayload>) -> Response {
    let plan = match plan_response_from_payload(payload) {
        Ok(plan) => plan,
        Err(response) => return response,
    };
    match schedule_to_string(&plan.report) {
        Ok(csv) => with_cache_control((
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"debt_plan.csv\"",
                ),
            ],
            csv,
        )),
        Err(e) => planner_error_response(&e),
    }
}

async fn import_handler(body: String) -> Response {
    match import_debts(&body) {
        Ok(debts) => json_response(StatusCode::OK, debts),
        Err(e) => planner_error_response(&e),
    }
}

async fn profile_get_handler(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Response {
    let key = match profile_key(&kind, &id) {
        Ok(key) => key,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    let Ok(store) = state.store.lock() else {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "profile store unavailable");
    };
    match store.load(&key) {
        Ok(Some(doc)) => json_response(StatusCode::OK, doc),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "profile not found"),
        Err(e) => planner_error_response(&e),
    }
}

async fn profile_put_handler(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    Json(mut update): Json<ProfileDocument>,
) -> Response {
    let key = match profile_key(&kind, &id) {
        Ok(key) => key,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    update.updated_at = Some(chrono::Utc::now().to_rfc3339());
    let Ok(mut store) = state.store.lock() else {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "profile store unavailable");
    };
    match store.save(&key, update) {
        Ok(doc) => json_response(StatusCode::OK, doc),
        Err(e) => planner_error_response(&e),
    }
}

fn plan_response_from_payload(payload: PlanPayload) -> Result<PlanResponse, Response> {
    let request = plan_request_from_payload(payload)
        .map_err(|msg| error_response(StatusCode::BAD_REQUEST, &msg))?;
    build_plan_response(&request).map_err(|e| planner_error_response(&e))
}

fn profile_key(kind: &str, id: &str) -> Result<ProfileKey, String> {
    let key = match kind {
        "anonymous" => ProfileKey::anonymous(id),
        "user" => ProfileKey::authenticated(id),
        other => return Err(format!("unknown profile kind '{other}'")),
    };
    key.ok_or_else(|| "profile id must not be empty".to_string())
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

fn planner_error_response(err: &PlannerError) -> Response {
    let status = match err {
        PlannerError::EmptyDebtSet | PlannerError::ImportFormat(_) | PlannerError::Json(_) => {
            StatusCode::BAD_REQUEST
        }
        PlannerError::StoreDisconnected => StatusCode::SERVICE_UNAVAILABLE,
        PlannerError::Csv(_) | PlannerError::Io(_) | PlannerError::Store(_) => {
            log::warn!("request failed: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_response(status, &err.to_string())
}

#[cfg(test)]
fn plan_request_from_json(json: &str) -> Result<PlanRequest, String> {
    let payload = serde_json::from_str::<PlanPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    plan_request_from_payload(payload)
}
