use clap::{Parser, Subcommand};
use rentdesk_core::models::UserInput;
use rentdesk_core::seed::seed_reference_data;
use rentdesk_core::services::{today, InvoiceService, RoleService, UserService};
use rentdesk_core::{BillingPeriod, CoreConfig, ReportService, Store};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "rentdesk")]
#[command(about = "Rentdesk property-rental back office CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the default currencies, payment types, payment modes and roles
    Seed,
    /// Issue rent invoices for every occupied unit
    GenerateInvoices {
        /// Billing period (YYYY-MM); defaults to the current month
        #[arg(long)]
        period: Option<BillingPeriod>,
    },
    /// Print the portfolio summary as JSON
    Summary,
    /// Create a back-office user
    CreateUser {
        /// Display name
        name: String,
        /// Login email
        email: String,
        /// Role name, e.g. "Administrator"
        role: String,
        /// Initial password (at least 8 characters)
        #[arg(long)]
        password: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rentdesk_core=warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'rentdesk --help' for commands");
        return Ok(());
    };

    let cfg = Arc::new(CoreConfig::from_env()?);
    let store = Arc::new(Store::open(cfg.data_dir())?);

    match command {
        Commands::Seed => {
            let report = seed_reference_data(&store)?;
            println!(
                "Seeded {} currencies, {} payment types, {} payment modes, {} roles",
                report.currencies, report.payment_types, report.payment_modes, report.roles
            );
        }
        Commands::GenerateInvoices { period } => {
            let period = period.unwrap_or_else(|| BillingPeriod::containing(today()));
            let report = InvoiceService::new(cfg, store).generate_monthly(period)?;
            for invoice in &report.generated {
                println!(
                    "{}  {}  due {}",
                    invoice.invoice_number, invoice.amount, invoice.due_on
                );
            }
            println!(
                "Period {}: {} generated, {} skipped",
                report.period,
                report.generated.len(),
                report.skipped.len()
            );
        }
        Commands::Summary => {
            let summary = ReportService::new(store).summary(today())?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::CreateUser {
            name,
            email,
            role,
            password,
        } => {
            let Some(role) = RoleService::new(store.clone()).find_by_name(&role)? else {
                eprintln!("No role named '{role}'. Run 'rentdesk seed' to create the defaults.");
                std::process::exit(1);
            };
            let user = UserService::new(store).create(UserInput {
                name,
                email,
                password,
                role_id: role.id,
                active: true,
            })?;
            println!("Created user {} with ID: {}", user.email, user.id);
        }
    }

    Ok(())
}
