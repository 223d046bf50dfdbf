use std::process;

use anyhow::Result;
use chrono::NaiveDate;

use juicy_core::journal::{DAILY_TARGET, quote_index};
use juicy_core::models::Motivation;
use juicy_core::service::JuicyService;

pub(crate) fn cmd_drink_log(
    svc: &mut JuicyService,
    date: NaiveDate,
    count: i32,
    json: bool,
) -> Result<()> {
    let update = svc.log_drink(date, count);

    if json {
        let view = serde_json::json!({
            "date": date.to_string(),
            "previous": update.previous,
            "completed": update.current,
            "target": DAILY_TARGET,
            "streak": svc.streak(date),
        });
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("{date}: {} / {DAILY_TARGET} drinks", update.current);
    if update.reached_target() {
        println!("Daily goal reached! Streak: {} day(s)", svc.streak(date));
    }
    Ok(())
}

pub(crate) fn cmd_drink_reset(svc: &mut JuicyService, date: NaiveDate) -> Result<()> {
    svc.reset_drinks(date);
    println!("{date}: counter reset");
    Ok(())
}

pub(crate) fn cmd_drink_status(svc: &JuicyService, date: NaiveDate, json: bool) -> Result<()> {
    let completed = svc.completed_on(date);
    let streak = svc.streak(date);

    if json {
        let view = serde_json::json!({
            "date": date.to_string(),
            "completed": completed,
            "target": DAILY_TARGET,
            "streak": streak,
        });
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("{date}: {completed} / {DAILY_TARGET} drinks — streak {streak} day(s)");
    Ok(())
}

pub(crate) fn cmd_quote(motivation: &Motivation, date: NaiveDate) -> Result<()> {
    if motivation.quotes.is_empty() {
        eprintln!("No quotes available");
        process::exit(2);
    }
    let quote = &motivation.quotes[quote_index(date, motivation.quotes.len())];
    println!("{quote}");
    Ok(())
}
