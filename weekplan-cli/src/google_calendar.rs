use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use google_calendar3::api::{Event, EventDateTime};
use google_calendar3::CalendarHub;
use hyper::client::HttpConnector;
use hyper_rustls::HttpsConnector;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use weekplan_core::ExternalBooking;

use crate::calendar::CalendarEvent;
use crate::state::ensure_weekplan_home;

// IMPORTANT: use the oauth2 version re-exported by google-calendar3 to avoid version mismatches.
use google_calendar3::oauth2;

type Hub = CalendarHub<HttpsConnector<HttpConnector>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleOAuthClient {
    pub client_id: String,
    pub client_secret: String,
    /// Defaults to https://accounts.google.com/o/oauth2/auth
    pub auth_uri: Option<String>,
    /// Defaults to https://oauth2.googleapis.com/token
    pub token_uri: Option<String>,
    /// Defaults to ["http://localhost"]
    pub redirect_uris: Option<Vec<String>>,
}

/// Counts from one sync run. Individual insert failures do not abort the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    pub created: usize,
    pub failed: usize,
}

const OAUTH_CLIENT_FILE: &str = "google_oauth.json";
const TOKEN_CACHE_FILE: &str = "google_token_cache.json";

/// What `connect` has left behind under the weekplan home.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuthStatus {
    pub client_saved: bool,
    pub token_cached: bool,
}

impl AuthStatus {
    pub fn is_connected(&self) -> bool {
        self.client_saved && self.token_cached
    }
}

fn oauth_client_path() -> Result<PathBuf> {
    Ok(ensure_weekplan_home()?.join(OAUTH_CLIENT_FILE))
}

fn token_cache_path() -> Result<PathBuf> {
    Ok(ensure_weekplan_home()?.join(TOKEN_CACHE_FILE))
}

fn auth_status_in(home: &Path) -> AuthStatus {
    AuthStatus {
        client_saved: home.join(OAUTH_CLIENT_FILE).is_file(),
        token_cached: home.join(TOKEN_CACHE_FILE).is_file(),
    }
}

/// Drop cached tokens. Returns false when there was nothing to drop.
fn disconnect_in(home: &Path) -> Result<bool> {
    let p = home.join(TOKEN_CACHE_FILE);
    if !p.exists() {
        return Ok(false);
    }
    fs::remove_file(&p).with_context(|| format!("remove {}", p.display()))?;
    info!(path = %p.display(), "removed Google token cache");
    Ok(true)
}

pub fn auth_status() -> Result<AuthStatus> {
    Ok(auth_status_in(&ensure_weekplan_home()?))
}

pub fn disconnect() -> Result<bool> {
    disconnect_in(&ensure_weekplan_home()?)
}

pub fn save_oauth_client(client: &GoogleOAuthClient) -> Result<()> {
    let p = oauth_client_path()?;
    fs::write(&p, serde_json::to_string_pretty(client)?)
        .with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn load_oauth_client() -> Result<GoogleOAuthClient> {
    let p = oauth_client_path()?;
    if !p.exists() {
        bail!(
            "Missing Google OAuth client config at {}. Run: weekplan calendar connect",
            p.display()
        );
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    Ok(serde_json::from_str(&s)?)
}

/// Interactive connect:
/// - user pastes client_id/client_secret from Google Cloud Console (Desktop app)
/// - we run OAuth installed-app flow
/// - tokens cached under ~/.weekplan/google_token_cache.json
pub async fn connect_interactive() -> Result<()> {
    println!("Google Calendar connect\n");
    println!("You need to create OAuth credentials once:\n");
    println!("1) Go to: https://console.cloud.google.com/apis/credentials");
    println!("2) Create credentials -> OAuth client ID");
    println!("3) Application type: Desktop app");
    println!("4) Copy client_id + client_secret\n");

    let client_id = prompt("Paste client_id")?;
    let client_secret = prompt("Paste client_secret")?;

    if !client_id.contains('.') || client_secret.len() < 10 {
        bail!("client_id/client_secret didn't look valid");
    }

    let client = GoogleOAuthClient {
        client_id,
        client_secret,
        auth_uri: Some("https://accounts.google.com/o/oauth2/auth".to_string()),
        token_uri: Some("https://oauth2.googleapis.com/token".to_string()),
        redirect_uris: Some(vec!["http://localhost".to_string()]),
    };

    save_oauth_client(&client)?;

    // Run OAuth flow (installed app) and cache token.
    let _hub = hub_from_client(&client).await?;

    println!("\nConnected. Tokens cached at: {}", token_cache_path()?.display());
    Ok(())
}

async fn hub_from_client(client: &GoogleOAuthClient) -> Result<Hub> {
    let installed = oauth2::ApplicationSecret {
        client_id: client.client_id.clone(),
        client_secret: client.client_secret.clone(),
        auth_uri: client
            .auth_uri
            .clone()
            .unwrap_or_else(|| "https://accounts.google.com/o/oauth2/auth".to_string()),
        token_uri: client
            .token_uri
            .clone()
            .unwrap_or_else(|| "https://oauth2.googleapis.com/token".to_string()),
        redirect_uris: client
            .redirect_uris
            .clone()
            .unwrap_or_else(|| vec!["http://localhost".to_string()]),
        ..Default::default()
    };

    let token_path = token_cache_path()?;
    let auth = oauth2::InstalledFlowAuthenticator::builder(
        installed,
        oauth2::InstalledFlowReturnMethod::HTTPRedirect,
    )
    .persist_tokens_to_disk(token_path)
    .build()
    .await
    .context("building oauth authenticator")?;

    let connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_native_roots()
        .https_or_http()
        .enable_http1()
        .build();
    Ok(CalendarHub::new(hyper::Client::builder().build(connector), auth))
}

async fn connected_hub() -> Result<Hub> {
    let client = load_oauth_client()?;
    hub_from_client(&client).await
}

fn prompt(label: &str) -> Result<String> {
    use std::io::{self, Write};
    print!("{}: ", label);
    io::stdout().flush().ok();
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s.trim().to_string())
}

/// Insert every event, tagged with its color and shown in `tz`.
pub async fn push_events(calendar_id: &str, events: &[CalendarEvent], tz: Tz) -> Result<SyncOutcome> {
    let hub = connected_hub().await?;
    let mut outcome = SyncOutcome::default();

    for e in events {
        let ev = Event {
            summary: Some(e.summary.clone()),
            description: Some(e.description.clone()),
            color_id: Some(e.color_id.to_string()),
            start: Some(EventDateTime {
                date_time: Some(e.start_utc),
                time_zone: Some(tz.name().to_string()),
                ..Default::default()
            }),
            end: Some(EventDateTime {
                date_time: Some(e.end_utc),
                time_zone: Some(tz.name().to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        match hub.events().insert(ev, calendar_id).doit().await {
            Ok(_) => outcome.created += 1,
            Err(err) => {
                warn!(summary = %e.summary, error = %err, "failed to create event");
                outcome.failed += 1;
            }
        }
    }

    info!(created = outcome.created, failed = outcome.failed, "calendar sync done");
    Ok(outcome)
}

/// Busy time in `[from, to)` as local bookings. Transparent ("free") events
/// are ignored; all-day events block their whole dates.
pub async fn list_busy(calendar_id: &str, from: DateTime<Utc>, to: DateTime<Utc>, tz: Tz) -> Result<Vec<ExternalBooking>> {
    let hub = connected_hub().await?;
    let (_, listing) = hub
        .events()
        .list(calendar_id)
        .time_min(from)
        .time_max(to)
        .single_events(true)
        .order_by("startTime")
        .max_results(2500)
        .doit()
        .await
        .with_context(|| format!("listing events in '{calendar_id}'"))?;

    let mut out = Vec::new();
    for ev in listing.items.unwrap_or_default() {
        if ev.transparency.as_deref() == Some("transparent") {
            continue;
        }
        let (Some(start), Some(end)) = (ev.start.as_ref(), ev.end.as_ref()) else { continue };
        let (Some(s), Some(e)) = (local_bound(start, tz), local_bound(end, tz)) else { continue };
        out.extend(ExternalBooking::spanning(s, e));
    }
    info!(bookings = out.len(), "fetched busy time");
    Ok(out)
}

fn local_bound(t: &EventDateTime, tz: Tz) -> Option<NaiveDateTime> {
    if let Some(dt) = t.date_time {
        return Some(dt.with_timezone(&tz).naive_local());
    }
    t.date.map(|d: NaiveDate| d.and_time(chrono::NaiveTime::MIN))
}

/// Horizon bounds for a busy query, from local midnight of `start`.
pub fn horizon_utc(start: NaiveDate, weeks: u32, tz: Tz) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    use chrono::TimeZone;
    let begin = start.and_time(chrono::NaiveTime::MIN);
    let end = begin + Duration::days(i64::from(weeks) * 7);
    let from = tz.from_local_datetime(&begin).earliest()?.with_timezone(&Utc);
    let to = tz.from_local_datetime(&end).earliest()?.with_timezone(&Utc);
    Some((from, to))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_saved_files() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            auth_status_in(dir.path()),
            AuthStatus {
                client_saved: false,
                token_cached: false
            }
        );

        fs::write(dir.path().join(OAUTH_CLIENT_FILE), "{}").unwrap();
        assert!(!auth_status_in(dir.path()).is_connected());

        fs::write(dir.path().join(TOKEN_CACHE_FILE), "[]").unwrap();
        assert!(auth_status_in(dir.path()).is_connected());
    }

    #[test]
    fn disconnect_removes_only_the_token_cache() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(OAUTH_CLIENT_FILE), "{}").unwrap();
        fs::write(dir.path().join(TOKEN_CACHE_FILE), "[]").unwrap();

        assert!(disconnect_in(dir.path()).unwrap());
        let status = auth_status_in(dir.path());
        assert!(status.client_saved);
        assert!(!status.token_cached);
        assert!(!disconnect_in(dir.path()).unwrap());
    }
}
