//! Command-line front end for the FriendCRM core.
//!
//! # Responsibility
//! - Wire configuration, logging and the filesystem backend together.
//! - Expose a few core use cases with plain positional arguments.
//! - Render results as text, or as JSON when `defaultFormat` is `json`.

use chrono::{NaiveDate, Utc};
use friendcrm_core::{
    core_version, init_logging, next_birthday, AppConfig, DriverRegistry, Friend, FriendService,
    FsStorageDriver, NewFriend,
};
use log::error;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

const CONFIG_ENV: &str = "FRIENDCRM_CONFIG";
const CONFIG_FILE_NAME: &str = ".friendcrm.json";
const USAGE: &str = "usage: friendcrm <list [name] | add <name> | remove <id> | fact <id> <text> | birthdays [days] | reconnect [days] | version>";

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=cli_command module=cli status=error error={message}");
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &[String]) -> Result<(), String> {
    let command = args.first().map(String::as_str).unwrap_or("list");
    if command == "version" {
        println!("friendcrm_core version={}", core_version());
        return Ok(());
    }

    let config = AppConfig::load(&config_path()).map_err(|err| err.to_string())?;
    if let Some(log_dir) = config.log_dir.as_deref() {
        init_logging(&config.log_level, log_dir).map_err(|err| err.to_string())?;
    }

    let registry = DriverRegistry::new();
    registry
        .configure(Arc::new(FsStorageDriver::new(config.data_dir.clone())))
        .await
        .map_err(|err| err.to_string())?;
    let service = FriendService::from_registry(&registry).map_err(|err| err.to_string())?;

    let output = Output {
        json: config.prefers_json(),
    };
    let result = dispatch(&service, output, command, &args[args.len().min(1)..]).await;
    registry.reset().await.map_err(|err| err.to_string())?;
    result
}

/// Selects text or JSON rendering for command results.
#[derive(Debug, Clone, Copy)]
struct Output {
    json: bool,
}

impl Output {
    /// Prints `value` as pretty JSON, or runs `text` for plain output.
    fn emit<T: Serialize>(self, value: &T, text: impl FnOnce()) -> Result<(), String> {
        if self.json {
            let rendered = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
            println!("{rendered}");
        } else {
            text();
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct UpcomingBirthday<'a> {
    #[serde(flatten)]
    friend: &'a Friend,
    next_birthday: NaiveDate,
    days_until: i64,
}

/// Pairs a friend with the date their birthday is next celebrated.
fn upcoming_birthday(friend: &Friend, today: NaiveDate) -> Option<UpcomingBirthday<'_>> {
    let next = friend.birthday.and_then(|date| next_birthday(date, today))?;
    Some(UpcomingBirthday {
        friend,
        next_birthday: next,
        days_until: (next - today).num_days(),
    })
}

async fn dispatch(
    service: &FriendService,
    output: Output,
    command: &str,
    rest: &[String],
) -> Result<(), String> {
    let arg = |index: usize| rest.get(index).map(String::as_str);
    let days = |index: usize| -> Result<Option<u32>, String> {
        arg(index)
            .map(|value| {
                value
                    .parse::<u32>()
                    .map_err(|_| format!("invalid number of days: {value}"))
            })
            .transpose()
    };

    match command {
        "list" => {
            let friends = service.list_friends(arg(0)).await.map_err(|e| e.to_string())?;
            output.emit(&friends, || {
                for friend in &friends {
                    println!("{}\t{}", friend.id, friend.name);
                }
            })?;
        }
        "add" => {
            let name = arg(0).ok_or(USAGE)?;
            let friend = service
                .add_friend(NewFriend::named(name))
                .await
                .map_err(|e| e.to_string())?;
            output.emit(&friend, || println!("added {} ({})", friend.name, friend.id))?;
        }
        "remove" => {
            let id = arg(0).ok_or(USAGE)?;
            let removed = service.remove_friend(id).await.map_err(|e| e.to_string())?;
            output.emit(&removed, || match &removed {
                Some(friend) => println!("removed {}", friend.name),
                None => println!("no friend with id {id}"),
            })?;
        }
        "fact" => {
            let (Some(id), Some(fact)) = (arg(0), arg(1)) else {
                return Err(USAGE.to_string());
            };
            let friend = service.add_fact(id, fact).await.map_err(|e| e.to_string())?;
            output.emit(&friend, || println!("added fact to {}: {fact}", friend.name))?;
        }
        "birthdays" => {
            let friends = service
                .birthdays_soon(days(0)?)
                .await
                .map_err(|e| e.to_string())?;
            let today = Utc::now().date_naive();
            let upcoming: Vec<UpcomingBirthday<'_>> = friends
                .iter()
                .filter_map(|friend| upcoming_birthday(friend, today))
                .collect();
            output.emit(&upcoming, || {
                if upcoming.is_empty() {
                    println!("no upcoming birthdays");
                }
                for entry in &upcoming {
                    println!(
                        "{} on {}",
                        entry.friend.name,
                        entry.next_birthday.format("%A, %B %-d")
                    );
                }
            })?;
        }
        "reconnect" => {
            let suggestions = service
                .reconnect_soon(days(0)?)
                .await
                .map_err(|e| e.to_string())?;
            output.emit(&suggestions, || {
                if suggestions.is_empty() {
                    println!("no friends to reconnect with");
                }
                for suggestion in &suggestions {
                    println!(
                        "- {}: last interaction {} days ago",
                        suggestion.friend.name, suggestion.days_since_last_interaction
                    );
                }
            })?;
        }
        _ => return Err(USAGE.to_string()),
    }
    Ok(())
}

fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(|home| PathBuf::from(home).join(CONFIG_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}
