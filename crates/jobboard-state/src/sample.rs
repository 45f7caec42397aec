//! Fixed job catalog for public browsing without a session.

use chrono::{DateTime, Duration, Utc};
use jobboard_models::Job;

/// Jobs served in sample mode.
#[derive(Debug, Clone, Default)]
pub struct SampleCatalog {
    jobs: Vec<Job>,
}

impl SampleCatalog {
    pub fn from_jobs(jobs: Vec<Job>) -> Self {
        Self { jobs }
    }

    /// The built-in listing, dated relative to `now`.
    pub fn builtin(now: DateTime<Utc>) -> Self {
        let jobs = BUILTIN
            .iter()
            .map(|row| Job {
                id: row.id,
                title: row.title.to_string(),
                company_name: row.company.to_string(),
                location: row.location.to_string(),
                job_type: row.job_type.to_string(),
                experience: row.experience.to_string(),
                salary: Some(row.salary),
                remote: row.remote,
                posted_at: now - Duration::days(row.days_ago),
                description: row.description.to_string(),
                skills: row.skills.iter().map(|s| s.to_string()).collect(),
                applied: false,
                saved: false,
            })
            .collect();
        Self::from_jobs(jobs)
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

struct Row {
    id: i64,
    title: &'static str,
    company: &'static str,
    location: &'static str,
    job_type: &'static str,
    experience: &'static str,
    salary: u64,
    remote: bool,
    days_ago: i64,
    skills: &'static [&'static str],
    description: &'static str,
}

const BUILTIN: &[Row] = &[
    Row {
        id: 1,
        title: "Senior Backend Engineer",
        company: "TechCorp Solutions",
        location: "Bangalore",
        job_type: "full-time",
        experience: "senior",
        salary: 2_400_000,
        remote: false,
        days_ago: 0,
        skills: &["Rust", "PostgreSQL", "Kubernetes"],
        description: "Own the core order pipeline and its storage layer.",
    },
    Row {
        id: 2,
        title: "Frontend Developer",
        company: "PixelWorks",
        location: "Pune",
        job_type: "full-time",
        experience: "mid",
        salary: 1_200_000,
        remote: true,
        days_ago: 2,
        skills: &["React", "TypeScript", "CSS"],
        description: "Build accessible dashboards for enterprise customers.",
    },
    Row {
        id: 3,
        title: "Data Analyst",
        company: "Insight Labs",
        location: "Hyderabad",
        job_type: "full-time",
        experience: "entry",
        salary: 700_000,
        remote: false,
        days_ago: 5,
        skills: &["SQL", "Python", "Tableau"],
        description: "Turn product telemetry into weekly business reviews.",
    },
    Row {
        id: 4,
        title: "DevOps Engineer",
        company: "CloudNine Systems",
        location: "Chennai",
        job_type: "contract",
        experience: "senior",
        salary: 1_800_000,
        remote: true,
        days_ago: 9,
        skills: &["Terraform", "AWS", "Kubernetes"],
        description: "Automate infrastructure for a multi-region platform.",
    },
    Row {
        id: 5,
        title: "Mobile Developer",
        company: "AppForge",
        location: "Mumbai",
        job_type: "full-time",
        experience: "mid",
        salary: 1_500_000,
        remote: false,
        days_ago: 12,
        skills: &["Kotlin", "Swift"],
        description: "Ship features to two million monthly users.",
    },
    Row {
        id: 6,
        title: "QA Intern",
        company: "TechCorp Solutions",
        location: "Bangalore",
        job_type: "internship",
        experience: "entry",
        salary: 300_000,
        remote: false,
        days_ago: 1,
        skills: &["Selenium", "Python"],
        description: "Write regression suites alongside the backend team.",
    },
    Row {
        id: 7,
        title: "Product Designer",
        company: "PixelWorks",
        location: "Remote",
        job_type: "part-time",
        experience: "mid",
        salary: 900_000,
        remote: true,
        days_ago: 20,
        skills: &["Figma", "User Research"],
        description: "Design onboarding flows for the mobile app.",
    },
    Row {
        id: 8,
        title: "Rust Systems Engineer",
        company: "Ferrous Networks",
        location: "Noida",
        job_type: "full-time",
        experience: "senior",
        salary: 3_000_000,
        remote: true,
        days_ago: 40,
        skills: &["Rust", "Tokio", "Networking"],
        description: "Build a low-latency packet broker in Rust.",
    },
];
