//! Command parsing and execution.

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use jobboard_client::ApiClient;
use jobboard_models::{mask_phone, FilterUpdate, Job, OtpPurpose, ProfileKind};
use jobboard_state::{
    AccountService, FileStorage, JobBoard, OtpFlow, ProfileStore, SampleCatalog, SessionStore,
    StateConfig,
};

/// Command-line client for the job board.
#[derive(Debug, Parser)]
#[command(name = "jobboard")]
#[command(about = "Browse jobs and manage a job-board account", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Browse jobs (sample listings when signed out)
    Jobs {
        /// Search terms matched against title, skills, company and description
        terms: Vec<String>,
    },
    /// Sign in; the code sent by SMS is read from stdin
    Login { email: String, password: String },
    /// Show the signed-in user
    #[command(name = "whoami")]
    WhoAmI,
    /// Forget the stored session
    Logout,
    /// Show the profile and completion score
    Profile,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Jobs { .. } => "jobs",
            Command::Login { .. } => "login",
            Command::WhoAmI => "whoami",
            Command::Logout => "logout",
            Command::Profile => "profile",
        }
    }
}

/// Stores wired together once per process.
pub struct App {
    config: StateConfig,
    client: Arc<ApiClient>,
    session: Arc<SessionStore>,
}

impl App {
    pub fn from_env() -> Result<Self> {
        let config = StateConfig::from_env();
        let client = Arc::new(ApiClient::from_env().context("invalid client configuration")?);
        let storage = Arc::new(FileStorage::new(config.storage_path.clone()));
        let session = SessionStore::new(client.clone(), storage);
        Ok(Self {
            config,
            client,
            session,
        })
    }

    pub async fn run(&self, command: Command) -> Result<()> {
        self.session.initialize().await;
        match command {
            Command::Jobs { terms } => self.jobs(terms.join(" ")).await,
            Command::Login { email, password } => self.login(&email, &password).await,
            Command::WhoAmI => self.whoami(),
            Command::Logout => {
                AccountService::new(self.client.clone(), self.session.clone()).logout();
                println!("Signed out.");
                Ok(())
            }
            Command::Profile => self.profile().await,
        }
    }

    async fn jobs(&self, search: String) -> Result<()> {
        let board = JobBoard::new(
            self.client.clone(),
            self.session.clone(),
            SampleCatalog::builtin(Utc::now()),
            self.config.page_size,
        );
        board.update_filters(FilterUpdate::default().search(search));
        board.search().await?;

        let jobs = board.visible_jobs();
        if jobs.is_empty() {
            println!("No jobs match.");
            return Ok(());
        }
        for job in &jobs {
            println!("{}", format_job(job));
        }
        println!(
            "page {} ({} jobs){}",
            board.current_page() + 1,
            board.total_jobs(),
            if board.has_next_page() { ", more available" } else { "" }
        );
        Ok(())
    }

    async fn login(&self, email: &str, password: &str) -> Result<()> {
        let otp = OtpFlow::new(
            self.client.clone(),
            self.session.clone(),
            self.config.resend_cooldown,
        );
        let phone = otp.initiate_login(email, password).await?;

        print!("Enter the code sent to {}: ", mask_phone(&phone));
        std::io::stdout().flush()?;
        let mut code = String::new();
        std::io::stdin().lock().read_line(&mut code)?;

        otp.verify_otp(&phone, code.trim(), OtpPurpose::Login).await?;
        let session = self.session.wait_until_resolved().await;
        match session.user {
            Some(user) => println!("Signed in as {} <{}>", user.name, user.email),
            None => bail!("signed in, but the account could not be loaded"),
        }
        Ok(())
    }

    fn whoami(&self) -> Result<()> {
        match self.session.user() {
            Some(user) => {
                println!("{} <{}>", user.name, user.email);
                println!("type: {}", user.user_type.as_str());
                if let Some(phone) = &user.phone {
                    let status = if user.is_verified { "verified" } else { "unverified" };
                    println!("phone: {} ({})", mask_phone(phone), status);
                }
            }
            None => println!("Not signed in."),
        }
        Ok(())
    }

    async fn profile(&self) -> Result<()> {
        if !self.session.is_authenticated() {
            bail!("not signed in");
        }
        let store = ProfileStore::new(self.client.clone(), self.session.clone());
        store.load_all().await?;

        let aggregate = store.aggregate();
        match &aggregate.profile {
            None => println!("No profile yet."),
            Some(ProfileKind::Employer(p)) => {
                println!("Employer profile");
                if let Some(designation) = &p.designation {
                    println!("  {}", designation);
                }
            }
            Some(ProfileKind::Jobseeker(p)) => {
                println!("{}", p.headline.as_deref().unwrap_or("Jobseeker profile"));
                println!("  completion: {}%", aggregate.completion_percentage);
                for w in &aggregate.work_experience {
                    println!("  work: {} at {}", w.job_title, w.company_name);
                }
                for e in &aggregate.education {
                    println!("  education: {}, {}", e.degree, e.institution);
                }
                if !aggregate.skills.is_empty() {
                    let names: Vec<&str> = aggregate.skills.iter().map(|s| s.name.as_str()).collect();
                    println!("  skills: {}", names.join(", "));
                }
            }
        }
        Ok(())
    }
}

fn format_job(job: &Job) -> String {
    let salary = job
        .salary
        .map(|s| format!("{:.1} LPA", s as f64 / 100_000.0))
        .unwrap_or_else(|| "salary n/a".to_string());
    let mut flags = Vec::new();
    if job.remote {
        flags.push("remote");
    }
    if job.saved {
        flags.push("saved");
    }
    if job.applied {
        flags.push("applied");
    }
    let flags = if flags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", flags.join(", "))
    };
    format!(
        "#{:<4} {} at {} ({}, {}){}",
        job.id, job.title, job.company_name, job.location, salary, flags
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, clap::Error> {
        let argv = std::iter::once("jobboard").chain(args.iter().copied());
        Cli::try_parse_from(argv).map(|cli| cli.command)
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            parse(&["jobs", "rust", "backend"]).unwrap(),
            Command::Jobs {
                terms: vec!["rust".into(), "backend".into()]
            }
        );
        assert_eq!(parse(&["jobs"]).unwrap(), Command::Jobs { terms: vec![] });
        assert_eq!(
            parse(&["login", "a@b.com", "pw12345678"]).unwrap(),
            Command::Login {
                email: "a@b.com".into(),
                password: "pw12345678".into()
            }
        );
        assert_eq!(parse(&["whoami"]).unwrap(), Command::WhoAmI);
        assert!(parse(&[]).is_err());
        assert!(parse(&["login", "only-email"]).is_err());
        assert!(parse(&["logout", "extra"]).is_err());
    }

    #[test]
    fn test_command_names_match_subcommands() {
        for name in ["whoami", "logout", "profile"] {
            assert_eq!(parse(&[name]).unwrap().name(), name);
        }
    }

    #[test]
    fn test_format_job() {
        let job: Job = serde_json::from_value(serde_json::json!({
            "id": 3,
            "title": "Rust Engineer",
            "companyName": "Acme",
            "location": "Pune",
            "salary": 1_250_000,
            "remote": true,
            "postedAt": "2026-10-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(format_job(&job), "#3    Rust Engineer at Acme (Pune, 12.5 LPA) [remote]");
    }
}
