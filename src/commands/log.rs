use super::current_repo;
use anyhow::Result;
use chrono::{Local, TimeZone};
use colored::Colorize;

pub fn log_command(count: usize) -> Result<()> {
    let repo = current_repo()?;

    let head = match repo.head_commit()? {
        Some(hash) => hash,
        None => {
            println!("{}", "No commits yet.".yellow());
            return Ok(());
        }
    };

    for entry in repo.log(&head, Some(count))? {
        let when = Local
            .timestamp_opt(entry.commit.timestamp, 0)
            .single()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S %z").to_string())
            .unwrap_or_default();

        println!("{} {}", "commit".yellow(), entry.hash.bright_yellow());
        println!("Author: {}", entry.commit.author);
        println!("Date:   {}", when);
        println!();
        for line in entry.commit.message.lines() {
            println!("    {}", line);
        }
        println!();
    }

    Ok(())
}
