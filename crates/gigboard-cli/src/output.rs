//! Terminal rendering of API results.

use std::process::ExitCode;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use gigboard_client::ApiResult;
use gigboard_core::{Category, Contract, Deliverable, Job, Proposal, Transaction, User, Wallet};

/// Hand data to `on_data`, or print the error and signal failure.
pub fn report<T>(result: ApiResult<T>, on_data: impl FnOnce(Option<T>)) -> ExitCode {
    match result {
        ApiResult::Data(data) => {
            on_data(data);
            ExitCode::SUCCESS
        }
        ApiResult::Error(message) => fail(&message),
    }
}

pub fn fail(message: &str) -> ExitCode {
    eprintln!("Error: {}", message);
    ExitCode::FAILURE
}

pub fn print_json(value: Option<Value>) {
    match value {
        Some(value) => match serde_json::to_string_pretty(&value) {
            Ok(text) => println!("{}", text),
            Err(_) => println!("{}", value),
        },
        None => println!("(no content)"),
    }
}

pub fn print_user(user: &User) {
    println!("User:");
    println!("  ID:       {}", user.id);
    println!("  Name:     {}", user.display_name());
    println!("  Email:    {}", user.email);
    println!("  Role:     {}", user.role);
    if let Some(profile) = &user.profile {
        if !profile.country.is_empty() {
            println!("  Country:  {}", profile.country);
        }
        if !profile.company_name.is_empty() {
            println!("  Company:  {}", profile.company_name);
        }
    }
}

pub fn print_categories(categories: Vec<Category>) {
    println!("Categories ({}):", categories.len());
    println!("{:<6}  {:<24}  {}", "ID", "NAME", "SLUG");
    println!("{}", "-".repeat(50));
    for category in categories {
        println!("{:<6}  {:<24}  {}", category.id, category.name, category.slug);
    }
}

pub fn print_jobs(jobs: Vec<Job>) {
    if jobs.is_empty() {
        println!("No jobs found");
        return;
    }

    println!("Jobs ({}):", jobs.len());
    println!(
        "{:<6}  {:<32}  {:<10}  {:<8}  {:<12}  {}",
        "ID", "TITLE", "BUDGET", "LEVEL", "DEADLINE", "STATUS"
    );
    println!("{}", "-".repeat(86));
    for job in jobs {
        println!(
            "{:<6}  {:<32}  {:<10}  {:<8}  {:<12}  {}",
            job.id,
            truncate(&job.title, 32),
            job.budget,
            job.experience_level,
            job.deadline,
            wire_name(&job.status)
        );
    }
}

pub fn print_job(job: &Job) {
    println!("Job:");
    println!("  ID:          {}", job.id);
    println!("  Title:       {}", job.title);
    println!("  Status:      {}", wire_name(&job.status));
    if let Some(category) = &job.category {
        println!("  Category:    {}", category.name);
    }
    println!("  Level:       {}", job.experience_level);
    println!("  Budget:      ${}", job.budget);
    println!("  Deadline:    {}", job.deadline);
    if let Some(client) = &job.client {
        println!("  Client:      {}", client.display_name());
    }
    if let Some(count) = job.proposals_count {
        println!("  Proposals:   {}", count);
    }
    println!("  Posted:      {}", format_time(job.created_at));
    if !job.description.is_empty() {
        println!();
        println!("{}", job.description);
    }
}

pub fn print_proposals(proposals: Vec<Proposal>) {
    if proposals.is_empty() {
        println!("No proposals found");
        return;
    }

    println!("Proposals ({}):", proposals.len());
    println!(
        "{:<6}  {:<28}  {:<10}  {:<6}  {:<10}  {}",
        "ID", "JOB", "PRICE", "DAYS", "STATUS", "SUBMITTED"
    );
    println!("{}", "-".repeat(86));
    for proposal in proposals {
        let job = proposal
            .job
            .as_ref()
            .map(|j| truncate(&j.title, 28))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<6}  {:<28}  {:<10}  {:<6}  {:<10}  {}",
            proposal.id,
            job,
            proposal.proposed_price,
            proposal.estimated_days,
            wire_name(&proposal.status),
            format_time(proposal.created_at)
        );
    }
}

pub fn print_contracts(contracts: Vec<Contract>) {
    if contracts.is_empty() {
        println!("No contracts found");
        return;
    }

    println!("Contracts ({}):", contracts.len());
    println!(
        "{:<6}  {:<28}  {:<10}  {:<12}  {}",
        "ID", "JOB", "PRICE", "DEADLINE", "STATUS"
    );
    println!("{}", "-".repeat(80));
    for contract in contracts {
        let job = contract
            .job
            .as_ref()
            .map(|j| truncate(&j.title, 28))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<6}  {:<28}  {:<10}  {:<12}  {}",
            contract.id,
            job,
            contract.price,
            contract.deadline,
            wire_name(&contract.status)
        );
    }
}

pub fn print_contract(contract: &Contract) {
    println!("Contract:");
    println!("  ID:          {}", contract.id);
    if let Some(job) = &contract.job {
        println!("  Job:         {}", job.title);
    }
    println!("  Status:      {}", wire_name(&contract.status));
    println!("  Price:       ${}", contract.price);
    println!("  Deadline:    {}", contract.deadline);
    if let Some(client) = &contract.client {
        println!("  Client:      {}", client.display_name());
    }
    if let Some(freelancer) = &contract.freelancer {
        println!("  Freelancer:  {}", freelancer.display_name());
    }
    println!("  Started:     {}", format_time(contract.started_at));
    if contract.status.is_terminal() {
        println!("  Completed:   {}", format_time(contract.completed_at));
    }
}

pub fn print_deliverables(deliverables: Vec<Deliverable>) {
    if deliverables.is_empty() {
        println!("No deliverables yet");
        return;
    }

    println!("Deliverables ({}):", deliverables.len());
    println!(
        "{:<6}  {:<8}  {:<10}  {:<20}  {}",
        "ID", "VERSION", "STATUS", "SUBMITTED", "MESSAGE"
    );
    println!("{}", "-".repeat(80));
    for deliverable in deliverables {
        println!(
            "{:<6}  {:<8}  {:<10}  {:<20}  {}",
            deliverable.id,
            deliverable.version,
            wire_name(&deliverable.status),
            format_time(deliverable.created_at),
            truncate(&deliverable.message, 40)
        );
    }
}

pub fn print_wallet(wallet: &Wallet) {
    println!("Wallet:");
    println!("  Available:   ${}", wallet.available_balance);
    println!("  In escrow:   ${}", wallet.escrow_balance);
    println!("  Updated:     {}", format_time(wallet.updated_at));
}

pub fn print_transactions(transactions: Vec<Transaction>) {
    if transactions.is_empty() {
        println!("No transactions yet");
        return;
    }

    println!("Transactions ({}):", transactions.len());
    println!(
        "{:<6}  {:<16}  {:<7}  {:<10}  {:<8}  {}",
        "ID", "TYPE", "DIR", "AMOUNT", "STATUS", "DATE"
    );
    println!("{}", "-".repeat(80));
    for tx in transactions {
        println!(
            "{:<6}  {:<16}  {:<7}  {:<10}  {:<8}  {}",
            tx.id,
            wire_name(&tx.kind),
            wire_name(&tx.direction),
            tx.amount,
            wire_name(&tx.status),
            format_time(tx.created_at)
        );
    }
}

/// The literal the backend uses for an enum value.
fn wire_name<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(Value::String(name)) => name,
        Ok(other) => other.to_string(),
        Err(_) => "?".to_string(),
    }
}

fn format_time(at: Option<DateTime<Utc>>) -> String {
    at.map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}
