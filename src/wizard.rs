//! Interactive setup wizard and the status/test commands.

use crossterm::style::Stylize;
use std::io::{self, BufRead, Write};

use crate::auth::{
    build_authorize_url, generate_state, try_open_browser, CallbackServer, OauthClient,
    TokenGuard, CALLBACK_TIMEOUT, REDIRECT_URI,
};
use crate::client::{default_date_range, Collection, OuraClient, OuraEndpoint};
use crate::cron::{self, time_to_cron, JobScheduler};
use crate::error::AuthError;
use crate::store::{unix_now_millis, ConfigStore};
use crate::types::{DailyActivity, DailyReadiness, DailySleep};

const CHANNEL_CHOICES: [&str; 5] = [
    "default (active channel at delivery time)",
    "imessage",
    "slack",
    "discord",
    "telegram",
];

// ---------------------------------------------------------------------------
// Prompt primitives
// ---------------------------------------------------------------------------

/// Ask a free-form question; an empty answer falls back to `default`.
fn ask(input: &mut impl BufRead, question: &str, default: Option<&str>) -> io::Result<String> {
    match default {
        Some(value) => print!("{question} ({value}) "),
        None => print!("{question} "),
    }
    io::stdout().flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    let answer = answer.trim();
    if answer.is_empty() {
        Ok(default.unwrap_or("").to_string())
    } else {
        Ok(answer.to_string())
    }
}

/// Yes/no question; an empty answer takes the default.
fn confirm(input: &mut impl BufRead, question: &str, default_yes: bool) -> io::Result<bool> {
    let hint = if default_yes { "[Y/n]" } else { "[y/N]" };
    print!("{question} {hint} ");
    io::stdout().flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    let answer = answer.trim().to_ascii_lowercase();
    if answer.is_empty() {
        Ok(default_yes)
    } else {
        Ok(answer == "y" || answer == "yes")
    }
}

/// Numbered choice; anything unrecognized falls back to the first option.
fn select(input: &mut impl BufRead, question: &str, choices: &[&str]) -> io::Result<String> {
    println!("{question}");
    for (idx, choice) in choices.iter().enumerate() {
        println!("  {}. {choice}", idx + 1);
    }
    print!("Choose [1-{}]: ", choices.len());
    io::stdout().flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    let picked = answer
        .trim()
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|idx| choices.get(idx))
        .unwrap_or(&choices[0]);
    Ok(picked.to_string())
}

// ---------------------------------------------------------------------------
// setup
// ---------------------------------------------------------------------------

/// Run the full interactive setup: credentials, browser authorization,
/// delivery preferences, and job scheduling.
pub async fn run_setup(
    store: &ConfigStore,
    oauth: &OauthClient,
    scheduler: &dyn JobScheduler,
    open_browser: bool,
) -> Result<(), String> {
    let stdin = io::stdin();
    let mut input = stdin.lock();

    println!();
    println!("{}", "=== Ouralink setup ===".bold());
    println!();
    println!("Before proceeding, create an Oura application:");
    println!("  1. Go to https://cloud.ouraring.com");
    println!("  2. Open \"My Applications\" and create a new application");
    println!("  3. Set the redirect URI to: {REDIRECT_URI}");
    println!();

    // Step 1: application identity.
    let client_id = ask(&mut input, "Oura client id:", None).map_err(|e| format!("input: {e}"))?;
    let client_secret =
        rpassword::prompt_password("Oura client secret: ").map_err(|e| format!("input: {e}"))?;
    if client_id.is_empty() || client_secret.is_empty() {
        return Err("client id and client secret are both required".to_string());
    }
    store
        .update(|config| {
            config.client_id = Some(client_id.clone());
            config.client_secret = Some(client_secret.clone());
        })
        .await
        .map_err(|e| format!("failed to save credentials: {e}"))?;

    // Step 2: browser authorization. The listener is bound before the
    // browser opens so the redirect can never race it.
    let state = generate_state();
    let authorize_url = build_authorize_url(&client_id, &state);
    let server = CallbackServer::bind(Some(state))
        .await
        .map_err(|e| format!("failed to start the callback listener: {e}"))?;

    println!();
    if open_browser && try_open_browser(&authorize_url) {
        println!("Opening your browser to authorize Ouralink...");
    } else {
        println!("Open this URL in your browser to authorize Ouralink:");
        println!("  {authorize_url}");
    }
    println!("Waiting for the OAuth callback on {REDIRECT_URI} ...");

    let code = server
        .wait_for_code(CALLBACK_TIMEOUT)
        .await
        .map_err(|e| format!("authorization failed: {}", AuthError::from(e)))?;
    println!("Authorization code received; exchanging for tokens...");

    let grant = oauth
        .exchange_code(&client_id, &client_secret, &code)
        .await
        .map_err(|e| format!("token exchange failed: {e}"))?;
    store
        .save_tokens(&grant)
        .await
        .map_err(|e| format!("failed to save tokens: {e}"))?;
    println!("Tokens saved.");
    println!();

    // Step 3: delivery preference.
    let choice = select(&mut input, "Preferred delivery channel:", &CHANNEL_CHOICES)
        .map_err(|e| format!("input: {e}"))?;
    let channel = if choice.starts_with("default") {
        "default".to_string()
    } else {
        choice
    };
    let channel_target = if channel == "default" {
        None
    } else {
        let target = ask(
            &mut input,
            &format!("Target for {channel} (phone number, webhook URL, chat id, ...):"),
            None,
        )
        .map_err(|e| format!("input: {e}"))?;
        (!target.is_empty()).then_some(target)
    };
    store
        .update(|config| {
            config.preferred_channel = Some(channel.clone());
            config.preferred_channel_target = channel_target.clone();
        })
        .await
        .map_err(|e| format!("failed to save channel preference: {e}"))?;

    // Step 4: schedule.
    let enable_scheduled = confirm(
        &mut input,
        "Enable scheduled morning & evening summaries?",
        true,
    )
    .map_err(|e| format!("input: {e}"))?;

    if enable_scheduled {
        let morning_time =
            ask(&mut input, "Morning summary time (HH:MM):", Some("07:00"))
                .map_err(|e| format!("input: {e}"))?;
        time_to_cron(&morning_time).map_err(|e| e.to_string())?;
        let evening_time =
            ask(&mut input, "Evening summary time (HH:MM):", Some("21:00"))
                .map_err(|e| format!("input: {e}"))?;
        time_to_cron(&evening_time).map_err(|e| e.to_string())?;
        let timezone = ask(
            &mut input,
            "Timezone (e.g. America/New_York):",
            Some("UTC"),
        )
        .map_err(|e| format!("input: {e}"))?;

        store
            .update(|config| {
                config.scheduled_messages = Some(true);
                config.morning_time = Some(morning_time.clone());
                config.evening_time = Some(evening_time.clone());
                config.timezone = Some(timezone.clone());
            })
            .await
            .map_err(|e| format!("failed to save schedule: {e}"))?;

        cron::create_jobs(store, scheduler)
            .await
            .map_err(|e| format!("failed to register scheduled jobs: {e}"))?;
        println!();
        println!("Scheduled jobs registered for morning and evening summaries.");
    } else {
        store
            .update(|config| config.scheduled_messages = Some(false))
            .await
            .map_err(|e| format!("failed to save schedule: {e}"))?;

        let config = store.get().await;
        if config.morning_cron_job_id.is_some() || config.evening_cron_job_id.is_some() {
            cron::remove_jobs(store, scheduler)
                .await
                .map_err(|e| format!("failed to remove scheduled jobs: {e}"))?;
            println!();
            println!("Existing scheduled jobs removed.");
        }
    }

    // Summary.
    let config = store.get().await;
    println!();
    println!("{}", "=== Setup complete ===".bold());
    println!("  Client id: {}", config.client_id.as_deref().unwrap_or("not set"));
    if let Some(expires_at) = config.token_expires_at {
        println!("  Token expires: {}", format_expiry(expires_at));
    }
    println!(
        "  Channel: {}",
        config.preferred_channel.as_deref().unwrap_or("default")
    );
    if let Some(target) = config.preferred_channel_target.as_deref() {
        println!("  Channel target: {target}");
    }
    if config.scheduled_messages == Some(true) {
        println!(
            "  Morning summary: {} {}",
            config.morning_time.as_deref().unwrap_or("07:00"),
            config.timezone.as_deref().unwrap_or("UTC")
        );
        println!(
            "  Evening summary: {} {}",
            config.evening_time.as_deref().unwrap_or("21:00"),
            config.timezone.as_deref().unwrap_or("UTC")
        );
    } else {
        println!("  Scheduled messages: disabled");
    }
    println!();
    println!("You can now ask your agent about your Oura data!");
    println!("Try: \"How did I sleep last night?\"");
    println!();
    Ok(())
}

// ---------------------------------------------------------------------------
// status
// ---------------------------------------------------------------------------

/// Print connection and schedule state.
pub async fn run_status(store: &ConfigStore) {
    let config = store.get().await;

    println!();
    println!("{}", "=== Ouralink status ===".bold());
    println!();

    if config.access_token.is_none() {
        println!("  Status: not connected");
        println!("  Run `ouralink setup` to get started.");
        println!();
        return;
    }

    println!("  Status: connected");
    println!("  Client id: {}", config.client_id.as_deref().unwrap_or("not set"));

    if let Some(expires_at) = config.token_expires_at {
        let hours_left = (expires_at - unix_now_millis()) / 3_600_000;
        println!("  Token expires: {} ({hours_left}h from now)", format_expiry(expires_at));
    }

    println!(
        "  Channel: {}",
        config.preferred_channel.as_deref().unwrap_or("default")
    );
    if let Some(target) = config.preferred_channel_target.as_deref() {
        println!("  Channel target: {target}");
    }

    if config.scheduled_messages == Some(true) {
        println!(
            "  Morning summary: {} {}",
            config.morning_time.as_deref().unwrap_or("07:00"),
            config.timezone.as_deref().unwrap_or("UTC")
        );
        println!(
            "  Evening summary: {} {}",
            config.evening_time.as_deref().unwrap_or("21:00"),
            config.timezone.as_deref().unwrap_or("UTC")
        );
        println!(
            "  Morning job id: {}",
            config.morning_cron_job_id.as_deref().unwrap_or("none")
        );
        println!(
            "  Evening job id: {}",
            config.evening_cron_job_id.as_deref().unwrap_or("none")
        );
    } else {
        println!("  Scheduled messages: disabled");
    }
    println!();
}

// ---------------------------------------------------------------------------
// test
// ---------------------------------------------------------------------------

/// Fetch today's data through the guard to verify the connection end to end.
pub async fn run_test(guard: &TokenGuard, client: &OuraClient) -> Result<(), String> {
    let config = guard.store().get().await;
    if config.access_token.is_none() {
        println!("Not connected. Run `ouralink setup` first.");
        return Ok(());
    }

    println!();
    println!("Fetching today's Oura data...");
    println!();

    let token = guard
        .ensure_valid_token()
        .await
        .map_err(|e| e.to_string())?;
    let (today, tomorrow) = default_date_range();

    let sleep: Collection<DailySleep> = client
        .fetch(&token, OuraEndpoint::DailySleep, Some(&today), Some(&tomorrow))
        .await
        .map_err(|e| test_failure("daily_sleep", e))?;
    print_page("Daily sleep", &sleep)?;

    let readiness: Collection<DailyReadiness> = client
        .fetch(
            &token,
            OuraEndpoint::DailyReadiness,
            Some(&today),
            Some(&tomorrow),
        )
        .await
        .map_err(|e| test_failure("daily_readiness", e))?;
    print_page("Daily readiness", &readiness)?;

    let activity: Collection<DailyActivity> = client
        .fetch(
            &token,
            OuraEndpoint::DailyActivity,
            Some(&today),
            Some(&tomorrow),
        )
        .await
        .map_err(|e| test_failure("daily_activity", e))?;
    print_page("Daily activity", &activity)?;

    println!("Connection test successful.");
    println!();
    Ok(())
}

fn test_failure(endpoint: &str, err: crate::error::ApiError) -> String {
    format!(
        "{endpoint} fetch failed: {err}\n\
         You may need to re-run `ouralink setup` if the token can no longer be refreshed."
    )
}

fn print_page<T: serde::Serialize>(label: &str, page: &Collection<T>) -> Result<(), String> {
    let rendered =
        serde_json::to_string_pretty(page).map_err(|e| format!("render {label}: {e}"))?;
    println!("{label}: {rendered}");
    println!();
    Ok(())
}

/// Render an epoch-millisecond expiry in the user's local time.
fn format_expiry(expires_at_ms: i64) -> String {
    use chrono::TimeZone;
    match chrono::Local.timestamp_millis_opt(expires_at_ms).single() {
        Some(when) => when.format("%Y-%m-%d %H:%M %Z").to_string(),
        None => format!("{expires_at_ms}ms"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn ask_returns_trimmed_answer() {
        let mut input = Cursor::new(b"  hello world  \n".to_vec());
        let answer = ask(&mut input, "q:", None).expect("ask");
        assert_eq!(answer, "hello world");
    }

    #[test]
    fn ask_empty_answer_takes_default() {
        let mut input = Cursor::new(b"\n".to_vec());
        let answer = ask(&mut input, "q:", Some("07:00")).expect("ask");
        assert_eq!(answer, "07:00");
    }

    #[test]
    fn ask_empty_answer_without_default_is_empty() {
        let mut input = Cursor::new(b"\n".to_vec());
        let answer = ask(&mut input, "q:", None).expect("ask");
        assert_eq!(answer, "");
    }

    #[test]
    fn confirm_defaults_apply_on_empty_input() {
        let mut input = Cursor::new(b"\n".to_vec());
        assert!(confirm(&mut input, "q?", true).expect("confirm"));
        let mut input = Cursor::new(b"\n".to_vec());
        assert!(!confirm(&mut input, "q?", false).expect("confirm"));
    }

    #[test]
    fn confirm_accepts_yes_variants() {
        for answer in ["y\n", "Y\n", "yes\n", "YES\n"] {
            let mut input = Cursor::new(answer.as_bytes().to_vec());
            assert!(confirm(&mut input, "q?", false).expect("confirm"), "{answer}");
        }
        let mut input = Cursor::new(b"n\n".to_vec());
        assert!(!confirm(&mut input, "q?", true).expect("confirm"));
    }

    #[test]
    fn select_picks_by_number() {
        let mut input = Cursor::new(b"3\n".to_vec());
        let choice = select(&mut input, "pick:", &["a", "b", "c"]).expect("select");
        assert_eq!(choice, "c");
    }

    #[test]
    fn select_falls_back_to_first_choice() {
        for answer in ["\n", "0\n", "9\n", "abc\n"] {
            let mut input = Cursor::new(answer.as_bytes().to_vec());
            let choice = select(&mut input, "pick:", &["a", "b"]).expect("select");
            assert_eq!(choice, "a", "answer {answer:?}");
        }
    }

    #[test]
    fn format_expiry_renders_local_time() {
        let rendered = format_expiry(1_750_000_000_000);
        assert!(rendered.starts_with("2025-"), "got: {rendered}");
    }
}
