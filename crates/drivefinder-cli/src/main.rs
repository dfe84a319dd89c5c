//! DriveFinder CLI - command-line form for car suggestions
//!
//! Usage:
//!     drivefinder [OPTIONS]
//!
//! With no preference flags and no image, the form is filled in interactively.
//!
//! Environment Variables (also read from a `.env` file):
//!     API_KEY: Gemini API key (required)
//!     DRIVEFINDER_BASE_URL: Model API base URL (default: https://generativelanguage.googleapis.com/v1beta)
//!     DRIVEFINDER_MODEL: Model name (default: gemini-1.5-pro)
//!     DRIVEFINDER_REQUEST_TIMEOUT: Request timeout in seconds (default: 120)
//!     DRIVEFINDER_CONNECT_TIMEOUT: Connection timeout in seconds (default: 10)
//!     RUST_LOG: Log filter (default: warn)

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use drivefinder::{
    AdvisorConfig, CarAdvisor, DriveFinderError, ModelConfig, PreferenceField, Suggestion,
    UserPreferences,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// DriveFinder - the perfect tool for your next car
#[derive(Parser, Debug)]
#[command(name = "drivefinder")]
#[command(about = "DriveFinder - car suggestions from your preferences or a photo")]
#[command(after_help = r#"Examples:
    # Fill in the form interactively
    drivefinder

    # One-shot search
    drivefinder --use-case "Comfortable city car" --price "20000 USD" --fuel-type Petrol

    # Identify the car in a photo
    drivefinder --image ./car.jpg

    # Verify the API key and exit
    drivefinder --check
"#)]
struct Cli {
    // Model options
    /// Model API base URL
    #[arg(
        long,
        env = "DRIVEFINDER_BASE_URL",
        default_value = "https://generativelanguage.googleapis.com/v1beta"
    )]
    base_url: String,

    /// Model name
    #[arg(long, env = "DRIVEFINDER_MODEL", default_value = "gemini-1.5-pro")]
    model: String,

    /// API key for model authentication
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<f64>,

    /// File with a custom instruction template
    #[arg(long, value_name = "FILE")]
    prompt_file: Option<PathBuf>,

    /// Check the API key and model, then exit
    #[arg(long)]
    check: bool,

    // Preference fields
    /// Main use case and what you are looking for (e.g. "Comfortable city car")
    #[arg(long)]
    use_case: Option<String>,

    /// Price range, in any currency
    #[arg(long)]
    price: Option<String>,

    /// Minimum fuel economy (km/l or mpg)
    #[arg(long)]
    economy: Option<String>,

    /// Body type (Hatchback, Sedan, SUV, ...)
    #[arg(long)]
    body_type: Option<String>,

    /// Seats and bootspace required
    #[arg(long)]
    practicality: Option<String>,

    /// Technology you would like (ADAS, sunroof, AWD, ...)
    #[arg(long)]
    technology: Option<String>,

    /// Preferred fuel type
    #[arg(long)]
    fuel_type: Option<String>,

    /// Preferred first and second colour
    #[arg(long, visible_alias = "colour")]
    color: Option<String>,

    /// Image of a car to identify (only the first one is sent)
    #[arg(long, value_name = "PATH", num_args = 1..)]
    image: Vec<PathBuf>,

    // Other options
    /// Log the rendered prompt and request details
    #[arg(short = 'v', long, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress everything but the suggestions and errors
    #[arg(short = 'q', long)]
    quiet: bool,
}

impl Cli {
    /// Preferences given as flags, or `None` when the form should be interactive
    fn preferences(&self) -> Option<UserPreferences> {
        let fields = [
            (PreferenceField::UseCase, &self.use_case),
            (PreferenceField::Price, &self.price),
            (PreferenceField::Economy, &self.economy),
            (PreferenceField::BodyType, &self.body_type),
            (PreferenceField::Practicality, &self.practicality),
            (PreferenceField::Technology, &self.technology),
            (PreferenceField::FuelType, &self.fuel_type),
            (PreferenceField::Colour, &self.color),
        ];

        if self.image.is_empty() && fields.iter().all(|(_, value)| value.is_none()) {
            return None;
        }

        let mut prefs = fields
            .into_iter()
            .fold(UserPreferences::new(), |prefs, (field, value)| match value {
                Some(v) => prefs.with_field(field, v.as_str()),
                None => prefs,
            });

        if let Some((first, rest)) = self.image.split_first() {
            if !rest.is_empty() {
                warn!("Only the first image is used; ignoring {} more", rest.len());
            }
            prefs = prefs.with_image(first);
        }

        Some(prefs)
    }
}

fn init_logging(args: &Cli) {
    let default_level = if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Check model API credentials before accepting submissions
async fn check_model_api(advisor: &CarAdvisor) -> bool {
    let base_url = &advisor.model_client().config().base_url;
    println!("\u{1F50D} Checking model API...");
    println!("{}", "-".repeat(50));

    print!("1. Checking API key and model ({})... ", base_url);
    io::stdout().flush().ok();

    match advisor.model_client().check_credentials().await {
        Ok(()) => {
            println!("\u{2705} OK");
            println!("{}", "-".repeat(50));
            println!("\u{2705} Model API checks passed!\n");
            true
        }
        Err(e) => {
            println!("\u{274C} FAILED");
            match &e {
                DriveFinderError::Auth(_) => {
                    println!("   Error: {}", e);
                    println!("   Solution:");
                    println!("     1. Check that API_KEY is set in the environment or .env");
                    println!("     2. Verify the key is enabled for the Generative Language API");
                }
                DriveFinderError::Transport(_) => {
                    println!("   Error: Cannot reach {}", base_url);
                    println!("   Solution:");
                    println!("     1. Check your network connection");
                    println!("     2. Verify the base URL is correct");
                }
                _ => println!("   Error: {}", e),
            }
            println!("{}", "-".repeat(50));
            println!("\u{274C} Model API check failed. Please fix the issues above.");
            false
        }
    }
}

/// Print application header
fn print_header(model_config: &ModelConfig, advisor_config: &AdvisorConfig) {
    let generation = &model_config.generation;
    println!("{}", "=".repeat(50));
    println!("\u{1F697} DriveFinder: The perfect tool for your next car! \u{1F697}");
    println!("{}", "=".repeat(50));
    println!("Model: {}", model_config.model_name);
    println!("Base URL: {}", model_config.base_url);
    println!(
        "Decoding: temperature={} top_p={} top_k={} max_output_tokens={}",
        generation.temperature, generation.top_p, generation.top_k, generation.max_output_tokens
    );
    if advisor_config.instruction_template.is_some() {
        println!("Instruction template: custom");
    }
    println!("{}", "=".repeat(50));
}

fn print_suggestion(suggestion: &Suggestion, quiet: bool) {
    if quiet {
        println!("{}", suggestion.reply.text);
        return;
    }

    println!("\n{}", "=".repeat(50));
    println!("The cars that suit all/most of your needs are:");
    if let Some(path) = &suggestion.image_path {
        println!("Image: {}", path.display());
    }
    println!("{}", "-".repeat(50));
    println!("{}", suggestion.reply.text.trim_end());
    println!("{}", "-".repeat(50));
    if let Some(total_time) = suggestion.reply.total_time {
        println!("\u{23F1}\u{FE0F}  Total time: {:.3}s", total_time);
    }
    if let Some(usage) = suggestion.reply.usage {
        println!(
            "Tokens: {} prompt + {} reply = {}",
            usage.prompt_token_count, usage.candidates_token_count, usage.total_token_count
        );
    }
    println!("{}\n", "=".repeat(50));
}

fn report_error(e: &DriveFinderError) {
    match e {
        DriveFinderError::ContentBlocked(reason) => {
            eprintln!("\nNo suggestion available: the model declined to answer ({}).", reason);
            eprintln!("Try rephrasing your preferences or using a different image.\n");
        }
        DriveFinderError::Auth(_) => {
            eprintln!("\nError: {}", e);
            eprintln!("Check the API_KEY setting and run `drivefinder --check`.\n");
        }
        DriveFinderError::Transport(_) => {
            eprintln!("\nFailed to generate suggestions: {}", e);
            eprintln!("Check your network connection and try again.\n");
        }
        _ => eprintln!("\nError: {}\n", e),
    }
}

/// Read one line; `None` on EOF or a quit command
fn read_answer(prompt: &str) -> Result<Option<String>> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    match io::stdin().lock().read_line(&mut input) {
        Ok(0) => return Ok(None),
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::Interrupted => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let answer = input.trim();
    if answer.eq_ignore_ascii_case("quit")
        || answer.eq_ignore_ascii_case("exit")
        || answer.eq_ignore_ascii_case("q")
    {
        return Ok(None);
    }
    Ok(Some(answer.to_string()))
}

/// Ask every form question; `None` when the user quits
fn read_form() -> Result<Option<UserPreferences>> {
    let mut prefs = UserPreferences::new();

    for field in PreferenceField::ALL {
        println!("{}", field.question());
        let Some(answer) = read_answer(&format!("  ({})\n> ", field.placeholder()))? else {
            return Ok(None);
        };
        prefs = prefs.with_field(field, answer);
    }

    println!("If you would like a picture of a car to be identified, enter its path.");
    let Some(image) = read_answer("  (press Enter to skip)\n> ")? else {
        return Ok(None);
    };
    if !image.is_empty() {
        prefs = prefs.with_image(image);
    }

    Ok(Some(prefs))
}

/// Notice shown when the form is submitted blank; the request is still sent
fn sparse_form_notice(prefs: &UserPreferences) -> Option<&'static str> {
    prefs
        .is_empty()
        .then_some("No preferences or image given; asking the model anyway.")
}

/// Run interactive mode
async fn run_interactive_mode(advisor: &CarAdvisor, quiet: bool) -> Result<()> {
    println!("\nEntering interactive mode. Type 'quit' at any question to exit.\n");

    loop {
        let Some(prefs) = read_form()? else {
            println!("Goodbye!");
            break;
        };

        if let Some(notice) = sparse_form_notice(&prefs) {
            println!("\n{}", notice);
        }

        println!("\nFinding cars...");
        match advisor.suggest(&prefs).await {
            Ok(suggestion) => print_suggestion(&suggestion, quiet),
            Err(e) => report_error(&e),
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Cli::parse();
    init_logging(&args);

    let api_key = args
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or_else(|| anyhow!("API_KEY is not set. Export it or add it to a .env file."))?;

    // Create configurations and advisor
    let mut model_config = ModelConfig::new(&args.base_url, &args.model).with_api_key(api_key);
    if let Some(timeout) = args.timeout {
        model_config = model_config.with_request_timeout(timeout);
    }

    let mut advisor_config = AdvisorConfig::new().with_verbose(args.verbose);
    if let Some(path) = &args.prompt_file {
        let template = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read prompt file {}", path.display()))?;
        advisor_config = advisor_config.with_instruction_template(template);
    }

    if !args.quiet {
        print_header(&model_config, &advisor_config);
    }

    let advisor = CarAdvisor::new(model_config, Some(advisor_config))?;

    if args.check {
        if !check_model_api(&advisor).await {
            std::process::exit(1);
        }
        return Ok(());
    }

    // Run with provided preferences or enter interactive mode
    match args.preferences() {
        Some(prefs) => match advisor.suggest(&prefs).await {
            Ok(suggestion) => print_suggestion(&suggestion, args.quiet),
            Err(e) => {
                report_error(&e);
                std::process::exit(1);
            }
        },
        None => run_interactive_mode(&advisor, args.quiet).await?,
    }

    Ok(())
}
