use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use lingo::config::Config;
use lingo::dictionary::{Dictionary, RemoteDictionary};
use lingo::engine::{AggregateSummary, ItemStatus, ProgressStore, classify, report};
use lingo::flow::LessonFlow;
use lingo::navigation::{DASHBOARD_ROUTE, NavigationStack};
use lingo::session::{QuestionBank, QuizState};
use lingo::speech::{PlaybackCallback, PlaybackEvent, Speaker};
use lingo::store::JsonStore;
use lingo::store::schema::ExportData;

#[derive(Parser)]
#[command(
    name = "lingo",
    version,
    about = "Lesson progress and practice quizzes for language learning"
)]
struct Cli {
    #[arg(long, help = "Directory holding progress files (overrides config)")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show item statuses for one category
    Status { category: String },
    /// Record an item status (completed, wrong, skipped, not_attempted)
    Record {
        category: String,
        item: u32,
        status: String,
    },
    /// Completion dashboard over every configured category
    Report,
    /// List bundled question banks
    Banks,
    /// Take a quiz and save the outcome for one lesson item
    Quiz {
        bank: String,
        #[arg(short, long, default_value_t = 1, help = "Lesson item the quiz belongs to")]
        item: u32,
        #[arg(long, help = "Seed for banks that shuffle their questions")]
        seed: Option<u64>,
        #[arg(long, help = "Read each prompt aloud")]
        speak: bool,
    },
    /// Look up a word in the online dictionary
    Lookup { word: String },
    /// Write all saved progress to a JSON file
    Export { path: PathBuf },
    /// Overwrite the categories in an export file; other saved categories are kept
    Import { path: PathBuf },
    /// Write the effective configuration to the config file
    Config,
}

/// Stand-in for a TTS engine: prints the text and finishes immediately.
struct ConsoleSpeaker;

impl Speaker for ConsoleSpeaker {
    fn speak(&self, text: &str, mut on_event: PlaybackCallback) {
        on_event(PlaybackEvent::Started);
        println!("  (say) {text}");
        on_event(PlaybackEvent::Done);
    }
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = Config::load();
    let config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => Config::default(),
    };
    init_tracing(&config.log_filter);
    if let Err(err) = loaded {
        warn!("config ignored: {err:#}");
    }

    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.data_dir));
    let kv = JsonStore::with_base_dir(data_dir.clone())
        .with_context(|| format!("opening progress directory {}", data_dir.display()))?;
    let store = ProgressStore::with_seeds(kv, config.seed_table()?);

    match cli.command {
        Command::Status { category } => show_status(&store, &config, &category),
        Command::Record {
            category,
            item,
            status,
        } => {
            let record = store.record_status_str(&category, item, &status)?;
            println!(
                "{category} #{item}: {}",
                record.status(item)
            );
            Ok(())
        }
        Command::Report => show_report(&store, &config),
        Command::Banks => list_banks(),
        Command::Quiz {
            bank,
            item,
            seed,
            speak,
        } => run_quiz(&store, &config, &bank, item, seed, speak),
        Command::Lookup { word } => lookup(&config, &word),
        Command::Export { path } => export(&store, &config, &path),
        Command::Import { path } => import(&store, &path),
        Command::Config => {
            config.save()?;
            println!("Wrote {}", Config::config_path().display());
            Ok(())
        }
    }
}

fn show_status(store: &ProgressStore<JsonStore>, config: &Config, category: &str) -> Result<()> {
    let record = store.load(category)?;
    let total = config.items_per_category;
    println!("{category}");
    for id in 1..=total {
        println!("  {id:>2}  {}", record.status(id));
    }
    for (id, status) in record.items().range(total + 1..) {
        println!("  {id:>2}  {status}  (outside configured range)");
    }
    print_summary(&store.stats(&record, total));
    Ok(())
}

fn print_summary(summary: &AggregateSummary) {
    println!(
        "  completed {}  wrong {}  skipped {}  not attempted {}  ({}% of {})",
        summary.total_completed,
        summary.total_wrong,
        summary.total_skipped,
        summary.total_not_attempted,
        summary.completion_percentage,
        summary.total_items
    );
}

fn progress_bar(percentage: u32, width: usize) -> String {
    let filled = (percentage.min(100) as usize * width).div_ceil(100);
    format!("{}{}", "#".repeat(filled), ".".repeat(width - filled))
}

fn show_report(store: &ProgressStore<JsonStore>, config: &Config) -> Result<()> {
    let report = report::build(store, &config.category_specs())?;
    for (id, summary) in &report.per_category {
        println!(
            "{id:<20} [{}] {:>3}%  {}",
            progress_bar(summary.completion_percentage, 20),
            summary.completion_percentage,
            classify(summary.completion_percentage).label()
        );
    }
    println!();
    println!("Overall");
    print_summary(&report.overall);
    Ok(())
}

fn list_banks() -> Result<()> {
    for name in QuestionBank::bundled_names() {
        let bank = QuestionBank::bundled(&name)?;
        println!(
            "{name:<16} {} ({} questions, category {})",
            bank.name,
            bank.questions.len(),
            bank.category
        );
    }
    Ok(())
}

fn read_line(lines: &mut impl Iterator<Item = io::Result<String>>) -> Result<Option<String>> {
    print!("> ");
    io::stdout().flush()?;
    match lines.next() {
        Some(line) => Ok(Some(line?.trim().to_string())),
        None => Ok(None),
    }
}

fn confirm(lines: &mut impl Iterator<Item = io::Result<String>>, question: &str) -> Result<bool> {
    println!("{question} [y/N]");
    Ok(matches!(read_line(lines)?.as_deref(), Some("y" | "Y" | "yes")))
}

fn run_quiz(
    store: &ProgressStore<JsonStore>,
    config: &Config,
    bank_name: &str,
    item: u32,
    seed: Option<u64>,
    speak: bool,
) -> Result<()> {
    let bank = QuestionBank::load(bank_name)?;
    let mut rng = match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };
    let session = bank.session(&mut rng)?;
    let mut flow = LessonFlow::new(
        store,
        NavigationStack::new(DASHBOARD_ROUTE),
        &bank.category,
        item,
        session,
    )?
    .with_pass_percentage(config.pass_percentage);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    println!("{} ({}, item {item})", bank.name, bank.category);

    loop {
        while !flow.session().is_complete() {
            let session = flow.session();
            let question = session.current_question()?;
            println!();
            println!(
                "Question {}/{}: {}",
                session.current_index() + 1,
                session.len(),
                question.prompt()
            );
            for (i, option) in question.options().iter().enumerate() {
                println!("  {}. {option}", i + 1);
            }
            if speak {
                flow.speak_prompt(&ConsoleSpeaker)?;
            }

            let Some(input) = read_line(&mut lines)? else {
                println!("Quiz abandoned; nothing saved.");
                return Ok(());
            };
            let choice = match input.parse::<usize>() {
                Ok(n) if (1..=question.options().len()).contains(&n) => {
                    question.options()[n - 1].clone()
                }
                _ => input,
            };
            if !question.has_option(&choice) {
                println!("Pick one of the listed options.");
                continue;
            }

            match flow.answer(&choice) {
                Ok(feedback) if feedback.correct => println!("Correct!"),
                Ok(feedback) => println!("Not quite: the answer is \"{}\".", feedback.correct_answer),
                Err(err) if err.is_persistence() => {
                    println!("Saving your progress failed: {err}");
                    loop {
                        if !confirm(&mut lines, "Retry saving?")? {
                            bail!("progress not saved");
                        }
                        match flow.retry_save() {
                            Ok(_) => break,
                            Err(err) => println!("Still failing: {err}"),
                        }
                    }
                }
                Err(err) => return Err(err.into()),
            }
        }

        if let (Some(result), QuizState::Completed(score)) = (flow.last_result(), flow.session().state()) {
            println!();
            println!(
                "Score: {score}/{} ({:.0}%) -> {}",
                result.total,
                result.accuracy,
                result.status(config.pass_percentage)
            );
            for &missed in &result.missed {
                let question = &flow.session().questions()[missed];
                println!(
                    "  missed: {} (you chose \"{}\", answer \"{}\")",
                    question.prompt(),
                    result.answers[missed],
                    question.correct_answer()
                );
            }
        }

        let perfect = flow.last_result().is_some_and(|r| r.is_perfect());
        if perfect || !confirm(&mut lines, "Try again?")? {
            break;
        }
        flow.try_again()?;
    }

    let record = store.load(&bank.category)?;
    if record.status(item) == ItemStatus::Completed {
        println!("{} item {item} is complete.", bank.category);
    }
    Ok(())
}

fn lookup(config: &Config, word: &str) -> Result<()> {
    let dictionary = RemoteDictionary::new(&config.dictionary_url);
    let entries = dictionary.lookup(word)?;
    for entry in entries {
        match entry.phonetic_text() {
            Some(phonetic) => println!("{} {phonetic}", entry.word),
            None => println!("{}", entry.word),
        }
        for meaning in &entry.meanings {
            println!("  {}", meaning.part_of_speech);
            for (i, definition) in meaning.definitions.iter().take(3).enumerate() {
                println!("    {}. {}", i + 1, definition.definition);
                if let Some(example) = &definition.example {
                    println!("       \"{example}\"");
                }
            }
        }
    }
    Ok(())
}

fn export(store: &ProgressStore<JsonStore>, config: &Config, path: &Path) -> Result<()> {
    let data = store.export(&config.categories)?;
    let json = serde_json::to_string_pretty(&data)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    println!(
        "Exported {} categories ({} items) to {}",
        data.categories.len(),
        data.item_count(),
        path.display()
    );
    Ok(())
}

fn import(store: &ProgressStore<JsonStore>, path: &Path) -> Result<()> {
    let json = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let data: ExportData =
        serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))?;
    store.import(&data)?;
    println!(
        "Imported {} categories ({} items)",
        data.categories.len(),
        data.item_count()
    );
    Ok(())
}
