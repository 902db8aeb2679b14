use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::info;

use wfa_rs::automaton::Automaton;
use wfa_rs::context::Context;
use wfa_rs::expression::Expression;
use wfa_rs::printer::Format;
use wfa_rs::proper::{Direction, ProperConfig};

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Print expressions with utf8 symbols.
    #[clap(long)]
    utf8: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build the derived-term automaton of an expression.
    Derive {
        /// Context, e.g. `lal_char(ab), z`.
        #[arg(value_name = "CTX")]
        ctx: String,
        #[arg(value_name = "EXP")]
        exp: String,
    },

    /// Print the expansion and the expanded form of an expression.
    Expand {
        #[arg(value_name = "CTX")]
        ctx: String,
        #[arg(value_name = "EXP")]
        exp: String,
    },

    /// Remove the spontaneous transitions of a DOT automaton.
    Proper {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Eliminate states forward instead of backward.
        #[clap(long)]
        forward: bool,
    },

    /// Print properties of a DOT automaton.
    Info {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Check ambiguity of a DOT automaton, with a witness word.
    Ambiguous {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Synchronize a multi-tape DOT automaton.
    Synchronize {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Determinize a Boolean DOT automaton.
    Determinize {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Evaluate a word on a DOT automaton.
    Eval {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(value_name = "WORD")]
        word: String,
    },
}

fn read_automaton(path: &PathBuf) -> color_eyre::Result<Automaton> {
    let text = std::fs::read_to_string(path)?;
    let aut = Automaton::from_dot(&text)?;
    info!(
        "Read {:?}: {} states, {} transitions",
        path,
        aut.num_states(),
        aut.num_transitions()
    );
    Ok(aut)
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    info!("args = {:?}", args);
    let format = if args.utf8 { Format::Utf8 } else { Format::Text };

    match args.command {
        Command::Derive { ctx, exp } => {
            let ctx = Context::parse(&ctx)?;
            let e = Expression::parse(&ctx, &exp)?;
            let dt = e.derived_term()?;
            for (s, origin) in &dt.origins {
                info!("state {} = {}", s, wfa_rs::printer::format_exp(origin, format));
            }
            print!("{}", dt.strip().to_dot()?);
        }
        Command::Expand { ctx, exp } => {
            let ctx = Context::parse(&ctx)?;
            let e = Expression::parse(&ctx, &exp)?;
            println!("expression: {}", e.format(format));
            println!("constant term: {}", e.constant_term()?);
            println!("expansion: {}", e.expansion()?.format(format));
            println!("expanded: {}", e.expand().format(format));
        }
        Command::Proper { file, forward } => {
            let aut = read_automaton(&file)?;
            let direction = if forward { Direction::Forward } else { Direction::Backward };
            let res = aut.proper(&ProperConfig::default().with_direction(direction))?;
            info!("Removed {} spontaneous transitions", aut.num_eps_transitions());
            print!("{}", res.to_dot()?);
        }
        Command::Info { file } => {
            let aut = read_automaton(&file)?;
            print!("{}", aut.info());
        }
        Command::Ambiguous { file } => {
            let aut = read_automaton(&file)?;
            if aut.is_ambiguous()? {
                println!("ambiguous on {}", aut.ambiguous_word()?);
            } else {
                println!("unambiguous");
            }
        }
        Command::Synchronize { file } => {
            let aut = read_automaton(&file)?;
            let res = aut.synchronize()?;
            info!("Synchronized into {} states", res.num_states());
            print!("{}", res.to_dot()?);
        }
        Command::Determinize { file } => {
            let aut = read_automaton(&file)?;
            let res = aut.determinize()?;
            info!("Determinized into {} states", res.num_states());
            print!("{}", res.to_dot()?);
        }
        Command::Eval { file, word } => {
            let aut = read_automaton(&file)?;
            println!("{}", aut.eval(&word)?);
        }
    }

    let time_total = time_total.elapsed();
    info!("All done in {:.3} s", time_total.as_secs_f64());

    Ok(())
}
