//! Gigboard CLI - Command line client for the Gigboard marketplace.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{ArgAction, Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use gigboard_client::config::DEFAULT_BASE_URL;
use gigboard_client::{
    ApiClient, ApiResult, Attachment, AuthService, FileCredentialStore, Marketplace,
};
use gigboard_core::{
    CategoryId, ContractId, DeliverableId, ExperienceLevel, JobId, LoginCredentials, NewJob,
    NewProposal, ProposalId, SignupData, UserRole,
};

mod config;
mod output;

use config::Config;

/// Gigboard CLI - Freelance marketplace client
#[derive(Parser)]
#[command(name = "gigboard")]
#[command(about = "CLI for the Gigboard freelance marketplace", long_about = None)]
struct Cli {
    /// Backend origin
    #[arg(long, env = "GIGBOARD_API_URL", default_value = DEFAULT_BASE_URL)]
    api_url: String,

    /// Credential file (defaults to the user config directory)
    #[arg(long, env = "GIGBOARD_CREDENTIALS")]
    credentials: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "GIGBOARD_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account and log into it
    Signup {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "GIGBOARD_PASSWORD", hide_env_values = true)]
        password: String,

        /// CLIENT or FREELANCER
        #[arg(short, long, default_value = "freelancer")]
        role: UserRole,
    },

    /// Forget the stored session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// List job categories
    Categories,

    /// Browse and post jobs
    #[command(subcommand)]
    Jobs(JobCommands),

    /// Submit and review proposals
    #[command(subcommand)]
    Proposals(ProposalCommands),

    /// Inspect and fund contracts
    #[command(subcommand)]
    Contracts(ContractCommands),

    /// Submit and review deliverables
    #[command(subcommand)]
    Deliverables(DeliverableCommands),

    /// Wallet balance and transfers
    #[command(subcommand)]
    Wallet(WalletCommands),

    /// Send a raw request and print the JSON response
    Request {
        /// GET, POST, PATCH, PUT or DELETE
        method: String,

        /// Path below the API origin, e.g. /jobs/jobs/
        path: String,

        /// JSON body
        #[arg(short, long)]
        body: Option<String>,
    },
}

#[derive(Subcommand)]
enum JobCommands {
    /// List open jobs
    List,

    /// Show one job
    Show { id: JobId },

    /// Post a new job
    Create {
        #[arg(long)]
        title: String,

        #[arg(long)]
        description: String,

        #[arg(long)]
        category: CategoryId,

        /// JUNIOR, MID or SENIOR
        #[arg(long, default_value = "mid")]
        level: ExperienceLevel,

        #[arg(long)]
        budget: String,

        /// Deadline as YYYY-MM-DD
        #[arg(long)]
        deadline: String,
    },
}

#[derive(Subcommand)]
enum ProposalCommands {
    /// List proposals for your role
    List {
        /// Override the role of the cached user
        #[arg(long)]
        role: Option<UserRole>,
    },

    /// Apply to a job
    Submit {
        job: JobId,

        #[arg(long)]
        cover_letter: String,

        #[arg(long)]
        price: String,

        #[arg(long)]
        days: u32,
    },

    /// Accept a proposal on one of your jobs
    Accept { id: ProposalId },

    /// Reject a proposal on one of your jobs
    Reject { id: ProposalId },
}

#[derive(Subcommand)]
enum ContractCommands {
    /// List contracts for your role
    List {
        #[arg(long)]
        role: Option<UserRole>,
    },

    /// Show one contract
    Show { id: ContractId },

    /// Lock the contract price in escrow
    Fund { id: ContractId },
}

#[derive(Subcommand)]
enum DeliverableCommands {
    /// List deliverables of a contract
    List { contract: ContractId },

    /// Upload work for a contract
    Submit {
        contract: ContractId,

        #[arg(short, long)]
        message: String,

        #[arg(short, long)]
        file: PathBuf,
    },

    /// Approve a deliverable and release escrow
    Approve { id: DeliverableId },

    /// Reject a deliverable
    Reject { id: DeliverableId },
}

#[derive(Subcommand)]
enum WalletCommands {
    /// Show balances
    Show,

    /// List wallet transactions
    Transactions,

    /// Start a deposit and print the checkout link
    Deposit { amount: f64 },

    /// Withdraw available funds
    Withdraw { amount: f64 },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::resolve(&cli.api_url, cli.credentials)?;
    let store = Arc::new(FileCredentialStore::new(config.credentials_path));
    tracing::debug!(
        api_url = %config.client.base_url,
        credentials = %store.path().display(),
        "Loaded configuration"
    );

    let client = ApiClient::new(config.client, store);
    let auth = AuthService::new(client.clone());
    let market = Marketplace::new(client.clone());

    let code = match cli.command {
        Commands::Login { email, password } => {
            let result = auth.login(&LoginCredentials { email, password }).await;
            output::report(result, |user| match user {
                Some(user) => println!("Logged in as {} ({})", user.display_name(), user.role),
                None => println!("Logged in"),
            })
        }
        Commands::Signup {
            email,
            password,
            role,
        } => {
            let result = auth
                .signup(&SignupData {
                    email,
                    password,
                    role,
                })
                .await;
            output::report(result, |user| match user {
                Some(user) => println!("Welcome, {} ({})", user.display_name(), user.role),
                None => println!("Account created"),
            })
        }
        Commands::Logout => {
            auth.logout().await;
            println!("Logged out");
            ExitCode::SUCCESS
        }
        Commands::Whoami => match auth.restore() {
            Some(user) => {
                output::print_user(&user);
                ExitCode::SUCCESS
            }
            None => output::fail("Not logged in"),
        },
        Commands::Categories => output::report(market.categories().await, |categories| {
            output::print_categories(categories.map(|c| c.into_items()).unwrap_or_default())
        }),
        Commands::Jobs(command) => run_jobs(&market, command).await,
        Commands::Proposals(command) => run_proposals(&market, &auth, command).await,
        Commands::Contracts(command) => run_contracts(&market, &auth, command).await,
        Commands::Deliverables(command) => run_deliverables(&market, command).await?,
        Commands::Wallet(command) => run_wallet(&market, command).await,
        Commands::Request { method, path, body } => {
            run_request(&client, &method, &path, body.as_deref()).await?
        }
    };

    Ok(code)
}

/// Role for role-dependent listings: explicit flag, else the cached user.
fn resolve_role(auth: &AuthService, role: Option<UserRole>) -> UserRole {
    role.or_else(|| auth.restore().map(|u| u.role))
        .unwrap_or_default()
}

async fn run_jobs(market: &Marketplace, command: JobCommands) -> ExitCode {
    match command {
        JobCommands::List => output::report(market.jobs().await, |jobs| {
            output::print_jobs(jobs.map(|j| j.into_items()).unwrap_or_default())
        }),
        JobCommands::Show { id } => output::report(market.job(id).await, |job| match job {
            Some(job) => output::print_job(&job),
            None => println!("Job {} returned no data", id),
        }),
        JobCommands::Create {
            title,
            description,
            category,
            level,
            budget,
            deadline,
        } => {
            let job = NewJob {
                title,
                description,
                category,
                experience_level: level,
                budget,
                deadline,
            };
            output::report(market.create_job(&job).await, |created| match created {
                Some(job) => println!("Job posted: {}", job.id),
                None => println!("Job posted"),
            })
        }
    }
}

async fn run_proposals(
    market: &Marketplace,
    auth: &AuthService,
    command: ProposalCommands,
) -> ExitCode {
    match command {
        ProposalCommands::List { role } => {
            let role = resolve_role(auth, role);
            output::report(market.proposals(role).await, |proposals| {
                output::print_proposals(proposals.map(|p| p.into_items()).unwrap_or_default())
            })
        }
        ProposalCommands::Submit {
            job,
            cover_letter,
            price,
            days,
        } => {
            let proposal = NewProposal {
                job,
                cover_letter,
                proposed_price: price,
                estimated_days: days,
            };
            output::report(market.submit_proposal(&proposal).await, |_| {
                println!("Proposal submitted for job {}", job)
            })
        }
        ProposalCommands::Accept { id } => output::report(market.accept_proposal(id).await, |_| {
            println!("Proposal {} accepted", id)
        }),
        ProposalCommands::Reject { id } => output::report(market.reject_proposal(id).await, |_| {
            println!("Proposal {} rejected", id)
        }),
    }
}

async fn run_contracts(
    market: &Marketplace,
    auth: &AuthService,
    command: ContractCommands,
) -> ExitCode {
    match command {
        ContractCommands::List { role } => {
            let role = resolve_role(auth, role);
            output::report(market.contracts(role).await, |contracts| {
                output::print_contracts(contracts.map(|c| c.into_items()).unwrap_or_default())
            })
        }
        ContractCommands::Show { id } => {
            output::report(market.contract(id).await, |contract| match contract {
                Some(contract) => output::print_contract(&contract),
                None => println!("Contract {} returned no data", id),
            })
        }
        ContractCommands::Fund { id } => output::report(market.fund_escrow(id).await, |_| {
            println!("Contract {} funded", id)
        }),
    }
}

async fn run_deliverables(
    market: &Marketplace,
    command: DeliverableCommands,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let code = match command {
        DeliverableCommands::List { contract } => {
            output::report(market.deliverables(contract).await, |deliverables| {
                output::print_deliverables(deliverables.map(|d| d.into_items()).unwrap_or_default())
            })
        }
        DeliverableCommands::Submit {
            contract,
            message,
            file,
        } => {
            let bytes = tokio::fs::read(&file).await?;
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload".to_string());
            let attachment = Attachment { file_name, bytes };
            let result = market
                .submit_deliverable(contract, &message, attachment)
                .await;
            output::report(result, |deliverable| match deliverable {
                Some(d) => println!("Deliverable {} submitted (version {})", d.id, d.version),
                None => println!("Deliverable submitted"),
            })
        }
        DeliverableCommands::Approve { id } => {
            output::report(market.approve_deliverable(id).await, |_| {
                println!("Deliverable {} approved", id)
            })
        }
        DeliverableCommands::Reject { id } => {
            output::report(market.reject_deliverable(id).await, |_| {
                println!("Deliverable {} rejected", id)
            })
        }
    };
    Ok(code)
}

async fn run_wallet(market: &Marketplace, command: WalletCommands) -> ExitCode {
    match command {
        WalletCommands::Show => output::report(market.wallet().await, |wallet| match wallet {
            Some(wallet) => output::print_wallet(&wallet),
            None => println!("No wallet data"),
        }),
        WalletCommands::Transactions => output::report(market.transactions().await, |txs| {
            output::print_transactions(txs.map(|t| t.into_items()).unwrap_or_default())
        }),
        WalletCommands::Deposit { amount } => {
            output::report(market.deposit(amount).await, |session| match session {
                Some(session) => println!("Complete the deposit at: {}", session.checkout_url),
                None => println!("Deposit started"),
            })
        }
        WalletCommands::Withdraw { amount } => {
            output::report(market.withdraw(amount).await, |withdrawal| match withdrawal {
                Some(w) => println!(
                    "Withdrawal of ${:.2} initiated (id {}, status {})",
                    amount, w.withdrawal_id, w.status
                ),
                None => println!("Withdrawal of ${:.2} initiated", amount),
            })
        }
    }
}

async fn run_request(
    client: &ApiClient,
    method: &str,
    path: &str,
    body: Option<&str>,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let body: Option<Value> = body.map(serde_json::from_str).transpose()?;

    let result: ApiResult<Value> = match method.to_ascii_uppercase().as_str() {
        "GET" => client.get(path).await,
        "POST" => client.post(path, body.as_ref()).await,
        "PATCH" => client.patch(path, body.as_ref()).await,
        "PUT" => client.put(path, body.as_ref()).await,
        "DELETE" => client.delete(path).await,
        other => return Ok(output::fail(&format!("Unsupported method: {}", other))),
    };

    Ok(output::report(result, output::print_json))
}
