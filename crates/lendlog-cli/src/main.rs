//! `lendlog`: command-line front end for a lendlog server.
//!
//! # Usage
//!
//! ```
//! lendlog --url http://localhost:8080 login --email ops@example.com
//! lendlog list --status overdue --sort date_to_be_returned --asc
//! lendlog add --name "Jane Doe" --reason fieldwork --days 5 --item Laptop-07=AT-102
//! lendlog return <ID>
//! lendlog watch --interval 60
//! ```

mod client;
mod output;
mod token;

use std::{
  io::{self, BufRead, Write},
  path::PathBuf,
  sync::Arc,
  time::Duration,
};

use anyhow::{Context, Result, anyhow, bail};
use chrono::{Days, Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use client::{ApiConfig, HttpStore};
use lendlog_core::{
  accounts::Accounts,
  client::RecordStoreClient,
  record::{BorrowStatus, RecordId, RecordPatch},
  session::{Session, SessionGate},
  submission::{Applied, Submission, SubmissionItem},
  sweep::OverdueSweeper,
  user::NewUser,
  view::{PageRequest, PendingCorrections, RecordViewModel, SortField, SortOrder, SortSpec, StatusFilter},
};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "lendlog", version, about = "Track borrowed equipment from the terminal")]
struct Cli {
  /// Path to a TOML config file (url, token_file).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the lendlog server (default: http://localhost:8080).
  #[arg(long, env = "LENDLOG_URL")]
  url: Option<String>,

  /// Where the session token is kept (default: ~/.config/lendlog/token).
  #[arg(long, env = "LENDLOG_TOKEN_FILE", value_name = "FILE")]
  token_file: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Sign in; the password is read from stdin.
  Login {
    #[arg(long)]
    email: String,
  },
  /// Sign out and forget the saved token.
  Logout,
  /// List records with optional search, filter, sort and paging.
  List(ListArgs),
  /// Record one borrower taking one or more items.
  Add(AddArgs),
  /// Edit fields of a record.
  Update(UpdateArgs),
  /// Mark a record returned.
  Return {
    id:   String,
    /// Return date (default: today).
    #[arg(long)]
    date: Option<NaiveDate>,
  },
  /// Delete a record.
  Delete { id: String },
  /// Manage the item catalog.
  Items {
    #[command(subcommand)]
    command: ItemsCommand,
  },
  /// Manage application users.
  Users {
    #[command(subcommand)]
    command: UsersCommand,
  },
  /// Status counts and top items / borrowers.
  Stats {
    #[arg(long, default_value_t = 5)]
    top: usize,
  },
  /// Keep marking late records overdue until interrupted.
  Watch {
    /// Seconds between sweeps.
    #[arg(long, default_value_t = 60)]
    interval: u64,
  },
}

#[derive(Args, Debug)]
struct ListArgs {
  /// Case-insensitive substring of the borrower's name.
  #[arg(long)]
  search:   Option<String>,
  /// `all`, `borrowed`, `overdue` or `returned`.
  #[arg(long, default_value = "all")]
  status:   StatusFilter,
  #[arg(long, default_value = "date_borrowed")]
  sort:     SortField,
  /// Sort ascending instead of descending.
  #[arg(long)]
  asc:      bool,
  #[arg(long, default_value_t = 1)]
  page:     usize,
  #[arg(long, default_value_t = 10)]
  per_page: usize,
}

#[derive(Args, Debug)]
struct AddArgs {
  /// Borrower's full name.
  #[arg(long)]
  name:     String,
  #[arg(long)]
  email:    Option<String>,
  #[arg(long)]
  reason:   String,
  /// Loan length in days.
  #[arg(long)]
  days:     u32,
  /// Borrow date (default: today).
  #[arg(long)]
  borrowed: Option<NaiveDate>,
  /// Due date (default: borrow date plus `--days`).
  #[arg(long)]
  due:      Option<NaiveDate>,
  /// One borrowed item as NAME=ASSET_TAG; repeat for several items.
  #[arg(long = "item", value_name = "NAME=TAG", required = true, value_parser = parse_item)]
  items:    Vec<SubmissionItem>,
}

#[derive(Args, Debug)]
struct UpdateArgs {
  id:          String,
  #[arg(long)]
  name:        Option<String>,
  #[arg(long, conflicts_with = "clear_email")]
  email:       Option<String>,
  /// Remove the borrower's email.
  #[arg(long)]
  clear_email: bool,
  #[arg(long)]
  item:        Option<String>,
  #[arg(long)]
  tag:         Option<String>,
  #[arg(long)]
  borrowed:    Option<NaiveDate>,
  #[arg(long)]
  days:        Option<u32>,
  #[arg(long)]
  reason:      Option<String>,
  #[arg(long)]
  status:      Option<BorrowStatus>,
  #[arg(long)]
  due:         Option<NaiveDate>,
  #[arg(long)]
  returned:    Option<NaiveDate>,
}

impl UpdateArgs {
  fn patch(&self) -> RecordPatch {
    RecordPatch {
      full_name:           self.name.clone(),
      email:               if self.clear_email { Some(None) } else { self.email.clone().map(Some) },
      item_name:           self.item.clone(),
      asset_tag:           self.tag.clone(),
      date_borrowed:       self.borrowed,
      days_borrowed:       self.days,
      reason:              self.reason.clone(),
      status:              self.status,
      date_to_be_returned: self.due,
      date_returned:       self.returned.map(Some),
    }
  }
}

#[derive(Subcommand, Debug)]
enum ItemsCommand {
  List,
  Add { name: String },
  Remove { name: String },
}

#[derive(Subcommand, Debug)]
enum UsersCommand {
  List,
  /// Create an account and profile; the password is read from stdin.
  Add {
    #[arg(long)]
    email:      String,
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name:  String,
  },
  Remove { uid: String },
}

fn parse_item(s: &str) -> Result<SubmissionItem, String> {
  let (name, tag) = s.split_once('=').ok_or_else(|| format!("expected NAME=TAG, got {s:?}"))?;
  Ok(SubmissionItem { item_name: name.trim().to_owned(), asset_tag: tag.trim().to_owned() })
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:        Option<String>,
  #[serde(default)]
  token_file: Option<PathBuf>,
}

struct Settings {
  base_url:   String,
  token_path: PathBuf,
}

impl Settings {
  fn store(&self, token: Option<String>) -> Result<HttpStore> {
    HttpStore::new(ApiConfig { base_url: self.base_url.clone(), token })
  }

  /// The saved session and a store that presents its token.
  fn signed_in(&self) -> Result<(HttpStore, Session)> {
    let session = token::load(&self.token_path)?.ok_or(lendlog_core::Error::Unauthenticated)?;
    let gate = SessionGate::restore(self.store(None)?, session);
    let session = gate.require()?.clone();
    Ok((self.store(Some(session.token.clone()))?, session))
  }

  fn view_model(&self) -> Result<RecordViewModel<HttpStore>> {
    let (store, _) = self.signed_in()?;
    Ok(RecordViewModel::new(RecordStoreClient::new(Arc::new(store))))
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let file_cfg: ConfigFile = if let Some(path) = &cli.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let ctx = Settings {
    base_url:   cli
      .url
      .or(file_cfg.url)
      .unwrap_or_else(|| "http://localhost:8080".to_string()),
    token_path: cli
      .token_file
      .or(file_cfg.token_file)
      .map(|p| token::expand_tilde(&p))
      .unwrap_or_else(token::default_path),
  };

  run(&ctx, cli.command).await
}

async fn run(ctx: &Settings, command: Command) -> Result<()> {
  match command {
    Command::Login { email } => {
      let password = read_password()?;
      let mut gate = SessionGate::new(ctx.store(None)?);
      let session = gate.sign_in(&email, &password).await?;
      token::save(&ctx.token_path, session)?;
      println!("signed in as {}", session.email);
    }

    Command::Logout => {
      let Some(session) = token::load(&ctx.token_path)? else {
        println!("not signed in");
        return Ok(());
      };
      let mut gate = SessionGate::restore(ctx.store(None)?, session);
      let remote = gate.sign_out().await;
      token::clear(&ctx.token_path)?;
      remote?;
      println!("signed out");
    }

    Command::List(args) => {
      let mut vm = ctx.view_model()?;
      report_corrections(vm.load().await?).await;
      vm.set_search_term(args.search.unwrap_or_default());
      vm.set_status_filter(args.status);
      let order = if args.asc { SortOrder::Ascending } else { SortOrder::Descending };
      let page = vm.page(
        SortSpec { field: args.sort, order },
        PageRequest { page: args.page, per_page: args.per_page },
      );
      print!("{}", output::records_page(&page));
    }

    Command::Add(args) => {
      let mut vm = ctx.view_model()?;
      let date_borrowed = args.borrowed.unwrap_or_else(|| Local::now().date_naive());
      let date_to_be_returned = match args.due {
        Some(due) => due,
        None => date_borrowed
          .checked_add_days(Days::new(args.days.into()))
          .ok_or_else(|| anyhow!("--days {} overflows the calendar", args.days))?,
      };
      let submission = Submission {
        full_name: args.name,
        email: args.email,
        date_borrowed,
        days_borrowed: args.days,
        reason: args.reason,
        status: BorrowStatus::Borrowed,
        date_to_be_returned,
        items: args.items,
      };
      match vm.submit(submission).await {
        Ok(created) => {
          for r in &created {
            print!("{}", output::record(r));
          }
        }
        Err(e) => {
          if e.applied() == Applied::Partial {
            eprintln!("created before the failure:");
            for r in &e.created {
              eprint!("{}", output::record(r));
            }
          }
          for item in &e.not_attempted {
            eprintln!("not sent: {} ({})", item.item_name, item.asset_tag);
          }
          return Err(e.into());
        }
      }
    }

    Command::Update(args) => {
      let patch = args.patch();
      if patch.is_empty() {
        bail!("nothing to update; pass at least one field flag");
      }
      let mut vm = ctx.view_model()?;
      report_corrections(vm.load().await?).await;
      let updated = vm.update_fields(&RecordId::from(args.id), patch).await?;
      print!("{}", output::record(&updated));
    }

    Command::Return { id, date } => {
      let mut vm = ctx.view_model()?;
      report_corrections(vm.load().await?).await;
      let patch = RecordPatch { date_returned: date.map(Some), ..RecordPatch::status(BorrowStatus::Returned) };
      let updated = vm.update_fields(&RecordId::from(id), patch).await?;
      print!("{}", output::record(&updated));
    }

    Command::Delete { id } => {
      let mut vm = ctx.view_model()?;
      vm.remove(&RecordId::from(id.as_str())).await?;
      println!("deleted {id}");
    }

    Command::Items { command } => {
      let vm = ctx.view_model()?;
      let client = vm.client();
      match command {
        ItemsCommand::List => print!("{}", output::items(&client.list_items().await?)),
        ItemsCommand::Add { name } => {
          let item = client.create_item(&name).await?;
          println!("added {}", item.name);
        }
        ItemsCommand::Remove { name } => {
          client.delete_item(&name).await?;
          println!("removed {}", name.trim());
        }
      }
    }

    Command::Users { command } => {
      let (store, _) = ctx.signed_in()?;
      let store = Arc::new(store);
      let accounts = Accounts::new(Arc::clone(&store), store);
      match command {
        UsersCommand::List => print!("{}", output::users(&accounts.list().await?)),
        UsersCommand::Add { email, first_name, last_name } => {
          let password = read_password()?;
          let profile = accounts.add(NewUser { email, password, first_name, last_name }).await?;
          println!("added {} ({})", profile.display_name(), profile.uid);
        }
        UsersCommand::Remove { uid } => {
          let removal = accounts.remove(&uid).await?;
          if !removal.profile_removed {
            eprintln!("note: {uid} had no profile");
          }
          if !removal.account_removed {
            eprintln!("note: {uid} had no account");
          }
          println!("removed {uid}");
        }
      }
    }

    Command::Stats { top } => {
      let mut vm = ctx.view_model()?;
      report_corrections(vm.load().await?).await;
      print!("{}", output::summary(&vm.summary(top)));
    }

    Command::Watch { interval } => {
      if interval == 0 {
        bail!("--interval must be at least 1 second");
      }
      let mut vm = ctx.view_model()?;
      report_corrections(vm.load().await?).await;
      let vm = Arc::new(tokio::sync::Mutex::new(vm));
      let handle = OverdueSweeper::spawn(Arc::clone(&vm), Duration::from_secs(interval));
      println!("watching for overdue records every {interval}s; Ctrl-C to stop");
      tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;
      handle.cancel().await;
      let overdue = vm
        .lock()
        .await
        .records()
        .iter()
        .filter(|r| r.status == BorrowStatus::Overdue)
        .count();
      println!("stopped; {overdue} overdue record(s)");
    }
  }
  Ok(())
}

/// Wait for the corrections a load triggered and mention any that failed.
async fn report_corrections(pending: PendingCorrections) {
  if pending.is_empty() {
    return;
  }
  let report = pending.settle().await;
  if !report.applied.is_empty() {
    eprintln!("marked {} record(s) overdue", report.applied.len());
  }
  for (id, err) in &report.failed {
    eprintln!("warning: could not mark {id} overdue: {err}");
  }
}

/// Read a password from one line of stdin.
fn read_password() -> Result<String> {
  eprint!("Password: ");
  io::stderr().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_owned())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn items_parse_as_name_equals_tag() {
    let item = parse_item(" Laptop-07 = AT-102").unwrap();
    assert_eq!(item, SubmissionItem { item_name: "Laptop-07".into(), asset_tag: "AT-102".into() });
    assert!(parse_item("Laptop-07").is_err());
  }

  #[test]
  fn list_flags_parse_into_view_types() {
    let cli = Cli::try_parse_from([
      "lendlog", "list", "--status", "overdue", "--sort", "date_to_be_returned", "--asc",
    ])
    .unwrap();
    let Command::List(args) = cli.command else { panic!("expected list") };
    assert_eq!(args.status, StatusFilter::Only(BorrowStatus::Overdue));
    assert_eq!(args.sort, SortField::DateToBeReturned);
    assert!(args.asc);
    assert_eq!((args.page, args.per_page), (1, 10));
  }

  #[test]
  fn add_requires_an_item() {
    let res = Cli::try_parse_from(["lendlog", "add", "--name", "Jane", "--reason", "r", "--days", "3"]);
    assert!(res.is_err());
  }

  #[test]
  fn update_flags_become_a_patch() {
    let cli = Cli::try_parse_from(["lendlog", "update", "r1", "--status", "returned", "--reason", "done"])
      .unwrap();
    let Command::Update(args) = cli.command else { panic!("expected update") };
    let patch = args.patch();
    assert_eq!(patch.status, Some(BorrowStatus::Returned));
    assert_eq!(patch.reason.as_deref(), Some("done"));
    assert_eq!(patch.full_name, None);
    assert_eq!(patch.email, None);
  }

  #[test]
  fn clear_email_sends_an_explicit_null() {
    let cli = Cli::try_parse_from(["lendlog", "update", "r1", "--clear-email"]).unwrap();
    let Command::Update(args) = cli.command else { panic!("expected update") };
    assert_eq!(args.patch().email, Some(None));

    let cli = Cli::try_parse_from(["lendlog", "update", "r1", "--email", "jd@example.com"]).unwrap();
    let Command::Update(args) = cli.command else { panic!("expected update") };
    assert_eq!(args.patch().email, Some(Some("jd@example.com".into())));

    assert!(Cli::try_parse_from(["lendlog", "update", "r1", "--email", "a@b.c", "--clear-email"]).is_err());
  }

  #[test]
  fn cli_definition_is_consistent() {
    use clap::CommandFactory;
    Cli::command().debug_assert();
  }
}
