use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    process::ExitCode,
};

use clap::{Args, Parser, Subcommand};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use spendlog::{
    Alert, AlertSink, ApiClient, ClientConfig, Error, Session, SessionEvent, SessionGate,
    ValidationError, View,
    alert::ConsoleAlerts,
    auth::{LogInForm, RegisterForm},
    category::{Category, CategoryForm},
    config::{DEFAULT_API_URL, DEFAULT_TIMEZONE, default_token_path},
    dashboard::summary_lines,
    expense::{
        Expense, ExpenseApi, ExpenseFormController, ExpenseList, FilterForm, FilterMode,
        SubmitOutcome,
    },
    format::format_currency,
    profile::{ChangePasswordForm, ProfileForm},
    session::{DEFAULT_REDIRECT_DELAY, FileTokenStore},
    timezone::local_now,
};

/// Track your spending from the terminal.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The base URL of the expense tracker API.
    #[arg(long, env = "SPENDLOG_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Whether expenses are filtered locally or by the backend.
    #[arg(long, env = "SPENDLOG_FILTER_MODE", value_enum, default_value = "local")]
    filter_mode: FilterMode,

    /// The canonical timezone used for new expenses, e.g. "Asia/Kolkata".
    #[arg(long, env = "SPENDLOG_TIMEZONE", default_value = DEFAULT_TIMEZONE)]
    timezone: String,

    /// Where to keep the session token.
    #[arg(long, env = "SPENDLOG_TOKEN_FILE")]
    token_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account.
    Register {
        /// Your display name.
        #[arg(long)]
        name: String,
        /// The email address to log in with.
        #[arg(long)]
        email: String,
    },
    /// Log in and remember the session.
    Login {
        /// The email address of the account.
        #[arg(long)]
        email: String,
    },
    /// Log out and forget the session.
    Logout,
    /// Show or change your profile.
    #[command(subcommand)]
    Profile(ProfileCommand),
    /// Manage categories.
    #[command(subcommand)]
    Categories(CategoryCommand),
    /// Manage expenses.
    #[command(subcommand)]
    Expenses(ExpenseCommand),
    /// Show a summary of your spending.
    Dashboard,
}

#[derive(Subcommand, Debug)]
enum ProfileCommand {
    /// Show your profile.
    Show,
    /// Change your name or profile image.
    Update {
        /// The new display name.
        #[arg(long)]
        name: Option<String>,
        /// A reference to the new profile image.
        #[arg(long)]
        image: Option<String>,
    },
    /// Change your password.
    Password,
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    /// List your categories.
    List,
    /// Create a category.
    Add {
        /// The name of the category.
        name: String,
        /// Select the category by default for new expenses.
        #[arg(long)]
        default: bool,
    },
    /// Rename a category or change whether it is a default.
    Edit {
        /// The ID of the category.
        id: String,
        /// The new name.
        #[arg(long)]
        name: String,
        /// Select the category by default for new expenses.
        #[arg(long)]
        default: bool,
    },
    /// Delete a category.
    Delete {
        /// The ID of the category.
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum ExpenseCommand {
    /// List expenses, optionally filtered.
    List(FilterArgs),
    /// Record an expense.
    Add(ExpenseArgs),
    /// Change an expense.
    Edit {
        /// The ID of the expense.
        id: String,
        #[command(flatten)]
        fields: ExpenseArgs,
    },
    /// Delete an expense.
    Delete {
        /// The ID of the expense.
        id: String,
        /// Do not ask for confirmation.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// Only show expenses in this category (ID).
    #[arg(long)]
    category: Option<String>,
    /// Only show expenses on or after this date (YYYY-MM-DD).
    #[arg(long)]
    from: Option<String>,
    /// Only show expenses on or before this date (YYYY-MM-DD).
    #[arg(long)]
    to: Option<String>,
    /// Only show expenses of at least this amount.
    #[arg(long)]
    min: Option<String>,
    /// Only show expenses of at most this amount.
    #[arg(long)]
    max: Option<String>,
}

#[derive(Args, Debug)]
struct ExpenseArgs {
    /// What the money was spent on.
    #[arg(long)]
    title: Option<String>,
    /// The amount spent.
    #[arg(long)]
    amount: Option<String>,
    /// A category name or ID, may be given more than once.
    #[arg(long = "category")]
    categories: Vec<String>,
    /// Optional free text.
    #[arg(long)]
    description: Option<String>,
    /// The date (YYYY-MM-DD), defaults to today.
    #[arg(long)]
    date: Option<String>,
    /// The time (HH:MM), defaults to now.
    #[arg(long)]
    time: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    setup_logging();

    let cli = Cli::parse();

    let config = ClientConfig {
        api_url: cli.api_url.clone(),
        filter_mode: cli.filter_mode,
        local_timezone: cli.timezone.clone(),
        token_path: cli.token_file.clone().or_else(default_token_path),
        redirect_delay: DEFAULT_REDIRECT_DELAY,
    };

    let (client, events) = match build_client(&config) {
        Ok(client) => client,
        Err(error) => {
            print_error(error);
            return ExitCode::FAILURE;
        }
    };

    let result = run(cli.command, &client, &config).await;

    // The gate holds the event sender, so dropping the client lets the
    // event loop finish once any pending redirect has been delivered.
    drop(client);
    report_session_events(events).await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(Failure::Error(error)) => {
            print_error(error);
            ExitCode::FAILURE
        }
        Err(Failure::Reported) => ExitCode::FAILURE,
    }
}

/// Why a command failed.
#[derive(Debug, PartialEq)]
enum Failure {
    /// An error that has not been shown to the user yet.
    Error(Error),
    /// The failure was already shown to the user as an alert.
    Reported,
}

impl From<Error> for Failure {
    fn from(value: Error) -> Self {
        Failure::Error(value)
    }
}

impl From<ValidationError> for Failure {
    fn from(value: ValidationError) -> Self {
        Failure::Error(value.into())
    }
}

fn setup_logging() {
    let stderr_log = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(stderr_log)
        .init();
}

fn build_client(
    config: &ClientConfig,
) -> Result<(ApiClient, UnboundedReceiver<SessionEvent>), Error> {
    let session = match &config.token_path {
        Some(path) => Session::load(FileTokenStore::new(path))?,
        None => Session::in_memory(),
    };

    let (gate, events) = SessionGate::new(session.clone(), config.redirect_delay);
    let client = ApiClient::new(config, session, gate)?;

    Ok((client, events))
}

async fn report_session_events(mut events: UnboundedReceiver<SessionEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::Expired(alert) => ConsoleAlerts.push(alert),
            SessionEvent::RedirectToLogIn => {
                eprintln!("Run `spendlog login --email <EMAIL>` to log in again.");
            }
        }
    }
}

async fn run(command: Command, client: &ApiClient, config: &ClientConfig) -> Result<(), Failure> {
    let mut alerts = ConsoleAlerts;

    match command {
        Command::Register { name, email } => {
            client.gate().set_view(View::Register);

            let Some(password) = prompt_password("Password: ") else {
                return Ok(());
            };
            let Some(confirm_password) = prompt_password("Confirm password: ") else {
                return Ok(());
            };

            let request = RegisterForm {
                name,
                email,
                password,
                confirm_password,
            }
            .validate()?;

            let response = client.register(&request).await?;
            alerts.push(Alert::success(&response.message));
        }
        Command::Login { email } => {
            client.gate().set_view(View::LogIn);

            let Some(password) = prompt_password("Password: ") else {
                return Ok(());
            };

            let request = LogInForm { email, password }.validate()?;
            client.log_in(&request).await?;
            alerts.push(Alert::success("Logged in"));
        }
        Command::Logout => {
            client.log_out().await?;
            alerts.push(Alert::success("Logged out"));
        }
        Command::Profile(command) => {
            client.gate().set_view(View::Profile);
            run_profile(command, client, &mut alerts).await?;
        }
        Command::Categories(command) => {
            client.gate().set_view(View::Expenses);
            run_categories(command, client, &mut alerts).await?;
        }
        Command::Expenses(command) => {
            client.gate().set_view(View::Expenses);
            run_expenses(command, client, config, &mut alerts).await?;
        }
        Command::Dashboard => {
            client.gate().set_view(View::Dashboard);

            let dashboard = client.get_dashboard().await?;

            for line in summary_lines(&dashboard) {
                println!("{line}");
            }
        }
    }

    Ok(())
}

async fn run_profile(
    command: ProfileCommand,
    client: &ApiClient,
    alerts: &mut impl AlertSink,
) -> Result<(), Error> {
    match command {
        ProfileCommand::Show => {
            let profile = client.get_profile().await?;

            println!("Name:  {}", profile.name);
            println!("Email: {}", profile.email);

            if let Some(image) = profile.profile_image {
                println!("Image: {image}");
            }
        }
        ProfileCommand::Update { name, image } => {
            let profile = client.get_profile().await?;
            let mut form = ProfileForm::from_profile(&profile);

            if let Some(name) = name {
                form.name = name;
            }

            if image.is_some() {
                form.profile_image = image;
            }

            client.update_profile(&form.validate()?).await?;
            alerts.push(Alert::success("Profile updated"));
        }
        ProfileCommand::Password => {
            let Some(current_password) = prompt_password("Current password: ") else {
                return Ok(());
            };
            let Some(new_password) = prompt_password("New password: ") else {
                return Ok(());
            };
            let Some(confirm_password) = prompt_password("Confirm new password: ") else {
                return Ok(());
            };

            let payload = ChangePasswordForm {
                current_password,
                new_password,
                confirm_password,
            }
            .validate()?;

            client.change_password(&payload).await?;
            alerts.push(Alert::success("Password changed"));
        }
    }

    Ok(())
}

async fn run_categories(
    command: CategoryCommand,
    client: &ApiClient,
    alerts: &mut impl AlertSink,
) -> Result<(), Error> {
    match command {
        CategoryCommand::List => {
            let categories = client.list_categories().await?;

            if categories.is_empty() {
                println!("No categories yet");
            }

            for category in categories {
                let marker = if category.is_default { " (default)" } else { "" };
                println!("{}  {}{marker}", category.id, category.name);
            }
        }
        CategoryCommand::Add { name, default } => {
            let payload = CategoryForm {
                name,
                is_default: default,
            }
            .validate()?;

            client.create_category(&payload).await?;
            alerts.push(Alert::success("Category created"));
        }
        CategoryCommand::Edit { id, name, default } => {
            let payload = CategoryForm {
                name,
                is_default: default,
            }
            .validate()?;

            client.update_category(&id, &payload).await?;
            alerts.push(Alert::success("Category updated"));
        }
        CategoryCommand::Delete { id } => {
            client.delete_category(&id).await?;
            alerts.push(Alert::success("Category deleted"));
        }
    }

    Ok(())
}

async fn run_expenses(
    command: ExpenseCommand,
    client: &ApiClient,
    config: &ClientConfig,
    alerts: &mut impl AlertSink,
) -> Result<(), Failure> {
    match command {
        ExpenseCommand::List(args) => {
            let filter = FilterForm {
                category_id: args.category.unwrap_or_default(),
                start_date: args.from.unwrap_or_default(),
                end_date: args.to.unwrap_or_default(),
                min_amount: args.min.unwrap_or_default(),
                max_amount: args.max.unwrap_or_default(),
            }
            .parse()?;

            let mut list = ExpenseList::new(config.filter_mode);

            if config.filter_mode == FilterMode::Local {
                list.load(client).await?;
            }

            list.apply_filter(client, filter).await?;
            print_expenses(list.expenses());
        }
        ExpenseCommand::Add(fields) => {
            let now = local_now(&config.local_timezone)?;
            let mut controller = ExpenseFormController::new();

            controller.open_for_add(now);
            controller.load_categories(client).await;

            if let Some(error) = controller.category_error() {
                tracing::warn!("{error}");
            }

            fill_form(&mut controller, fields)?;
            submit(&mut controller, client, alerts).await?;
        }
        ExpenseCommand::Edit { id, fields } => {
            let now = local_now(&config.local_timezone)?;
            let expenses = client.list_expenses(None).await?;

            let expense = find_expense(&expenses, &id, alerts)?;

            let mut controller = ExpenseFormController::new();
            controller.load_categories(client).await;
            controller.open_for_edit(expense, now);

            fill_form(&mut controller, fields)?;
            submit(&mut controller, client, alerts).await?;
        }
        ExpenseCommand::Delete { id, yes } => {
            if !yes && !confirm(&format!("Delete expense {id}?")) {
                println!("Nothing was deleted");
                return Ok(());
            }

            let mut list = ExpenseList::new(config.filter_mode);
            list.delete(client, &id).await?;
            alerts.push(Alert::success("Expense deleted"));
        }
    }

    Ok(())
}

fn find_expense<'a>(
    expenses: &'a [Expense],
    id: &str,
    alerts: &mut impl AlertSink,
) -> Result<&'a Expense, Failure> {
    match expenses.iter().find(|expense| expense.id == id) {
        Some(expense) => Ok(expense),
        None => {
            alerts.push(Alert::error(
                "Failed to update expense",
                &format!("No expense with the ID {id}"),
            ));
            Err(Failure::Reported)
        }
    }
}

fn fill_form(controller: &mut ExpenseFormController, fields: ExpenseArgs) -> Result<(), Error> {
    let category_ids: Vec<String> = fields
        .categories
        .iter()
        .map(|name_or_id| resolve_category(controller.categories(), name_or_id))
        .collect();

    let form = controller.form_mut()?;

    if let Some(title) = fields.title {
        form.title = title;
    }

    if let Some(amount) = fields.amount {
        form.amount = amount;
    }

    if let Some(description) = fields.description {
        form.description = description;
    }

    if let Some(date) = fields.date {
        form.expense_date = date;
    }

    if let Some(time) = fields.time {
        form.expense_time = time;
    }

    if !category_ids.is_empty() {
        form.category_ids = category_ids;
    }

    Ok(())
}

async fn submit(
    controller: &mut ExpenseFormController,
    api: &impl ExpenseApi,
    alerts: &mut impl AlertSink,
) -> Result<(), Failure> {
    match controller.submit(api, alerts).await? {
        SubmitOutcome::Saved => Ok(()),
        SubmitOutcome::Failed => Err(Failure::Reported),
        SubmitOutcome::Invalid => {
            if let Some(error) = controller.error() {
                alerts.push(Alert::error_simple(error));
            }

            Err(Failure::Reported)
        }
    }
}

/// The ID of the category named `name_or_id`, or `name_or_id` itself.
fn resolve_category(categories: &[Category], name_or_id: &str) -> String {
    categories
        .iter()
        .find(|category| category.name.eq_ignore_ascii_case(name_or_id))
        .map(|category| category.id.clone())
        .unwrap_or_else(|| name_or_id.to_owned())
}

fn print_expenses(expenses: &[Expense]) {
    if expenses.is_empty() {
        println!("No expenses found");
        return;
    }

    for expense in expenses {
        println!(
            "{}  {} {}  {:>12}  {}  [{}]",
            expense.id,
            expense.expense_date,
            expense.expense_time,
            format_currency(expense.amount),
            expense.title,
            expense.category_label()
        );
    }

    let total: f64 = expenses.iter().map(|expense| expense.amount).sum();
    println!("Total: {}", format_currency(total));
}

fn prompt_password(prompt: &str) -> Option<String> {
    match rpassword::prompt_password(prompt) {
        Ok(password) => Some(password),
        Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => None,
        Err(error) => {
            print_error(format!("Could not read password from stdin: {error}"));
            None
        }
    }
}

fn confirm(question: &str) -> bool {
    print!("{question} [y/N] ");

    if io::stdout().flush().is_err() {
        return false;
    }

    let mut answer = String::new();

    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }

    matches!(answer.trim(), "y" | "Y" | "yes")
}

fn print_error(error: impl ToString) {
    eprintln!(
        "\x1b[31;1m{}\x1b[0m",
        capitalise_first_char(&error.to_string())
    )
}

fn capitalise_first_char(string: &str) -> String {
    let mut chars = string.chars();
    let Some(first) = chars.next() else {
        return String::with_capacity(0);
    };
    first.to_uppercase().chain(chars).collect()
}

#[cfg(test)]
mod tests {
    use spendlog::{
        Alert, Error,
        category::Category,
        expense::{Expense, ExpenseApi, ExpenseFormController, ExpensePayload, ExpenseQuery},
    };
    use time::macros::datetime;

    use super::{Failure, find_expense, submit};

    /// Accepts nothing, every call fails.
    struct Offline;

    impl ExpenseApi for Offline {
        async fn list_expenses(
            &self,
            _query: Option<&ExpenseQuery>,
        ) -> Result<Vec<Expense>, Error> {
            Err(Error::NotLoggedIn)
        }

        async fn create_expense(&self, _payload: &ExpensePayload) -> Result<(), Error> {
            Err(Error::NotLoggedIn)
        }

        async fn update_expense(&self, _id: &str, _payload: &ExpensePayload) -> Result<(), Error> {
            Err(Error::NotLoggedIn)
        }

        async fn delete_expense(&self, _id: &str) -> Result<(), Error> {
            Err(Error::NotLoggedIn)
        }

        async fn list_categories(&self) -> Result<Vec<Category>, Error> {
            Err(Error::NotLoggedIn)
        }
    }

    fn open_controller() -> ExpenseFormController {
        let mut controller = ExpenseFormController::new();
        controller.open_for_add(datetime!(2025-03-07 13:30));
        controller
    }

    #[tokio::test]
    async fn invalid_form_fails_the_command() {
        let mut controller = open_controller();
        let mut alerts: Vec<Alert> = Vec::new();

        let result = submit(&mut controller, &Offline, &mut alerts).await;

        assert_eq!(result, Err(Failure::Reported));
        assert_eq!(alerts.len(), 1);
    }

    #[tokio::test]
    async fn rejected_save_fails_the_command() {
        let mut controller = open_controller();
        let form = controller.form_mut().unwrap();
        form.title = "Lunch".to_owned();
        form.amount = "12.50".to_owned();
        form.category_ids = vec!["A".to_owned()];
        let mut alerts: Vec<Alert> = Vec::new();

        let result = submit(&mut controller, &Offline, &mut alerts).await;

        assert_eq!(result, Err(Failure::Reported));
        assert!(!alerts.is_empty());
    }

    #[test]
    fn unknown_expense_fails_the_command() {
        let expenses: Vec<Expense> = serde_json::from_value(serde_json::json!([{
            "id": "e1",
            "title": "Lunch",
            "amount": 12.5,
            "expense_date": "07-03-2025",
            "expense_time": "01:30 PM"
        }]))
        .unwrap();
        let mut alerts: Vec<Alert> = Vec::new();

        assert_eq!(find_expense(&expenses, "e1", &mut alerts).unwrap().title, "Lunch");
        assert_eq!(
            find_expense(&expenses, "e2", &mut alerts).map(|expense| expense.id.clone()),
            Err(Failure::Reported)
        );
        assert_eq!(alerts.len(), 1);
    }
}
