use anyhow::Context;
use clap::Parser;
use contingency::{Key, Summary, Table, Value};
use csv_core::{ReadFieldResult, ReaderBuilder};
use lasso::{Rodeo, Spur};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::{io, mem, str};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Builds a probability table from delimited records on stdin and prints its marginal or
/// conditional distribution.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Field delimiter; must be a single-byte character.
    #[arg(short, long, default_value_t = '\t')]
    delimiter: char,

    /// Treat the first record as data rather than column names.
    #[arg(long)]
    no_header: bool,

    /// The first field of every record is a count for that record.
    #[arg(short, long)]
    weighted: bool,

    /// Keep only records where NAME equals VALUE, then drop column NAME.
    #[arg(short, long, value_name = "NAME=VALUE", value_parser = parse_selection)]
    given: Vec<(String, String)>,

    /// Sum column NAME away.
    #[arg(short, long, value_name = "NAME")]
    sum_out: Vec<String>,

    /// Partition the table by column NAME.
    #[arg(short, long, value_name = "NAME")]
    condition_on: Vec<String>,

    /// Print counts instead of probabilities.
    #[arg(short, long)]
    raw: bool,
}

fn parse_selection(arg: &str) -> Result<(String, String), String> {
    arg.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected NAME=VALUE, got {:?}", arg))
}

struct Records {
    names: Option<Vec<String>>,
    rows: Vec<(Key, f64)>,
}

fn load_data<I: io::Read>(
    mut input: I,
    delimiter: u8,
    header: bool,
    weighted: bool,
) -> io::Result<Records> {
    let mut inputbuf = [0; 16384];
    let mut fieldbuf = [0; 1024];
    let mut fieldlen = 0;
    let mut record: SmallVec<[Spur; 8]> = SmallVec::new();
    let mut count = None;
    let mut counts: HashMap<SmallVec<[Spur; 8]>, f64> = HashMap::new();
    let mut header_fields = Vec::new();
    let mut names = None;
    let mut rodeo = Rodeo::new();
    let mut reader = ReaderBuilder::new().delimiter(delimiter).build();

    loop {
        let read = input.read(&mut inputbuf)?;
        let mut bytes = &inputbuf[..read];
        loop {
            let (result, nin, nout) = reader.read_field(bytes, &mut fieldbuf[fieldlen..]);
            bytes = &bytes[nin..];
            fieldlen += nout;
            match result {
                ReadFieldResult::InputEmpty => break,
                ReadFieldResult::OutputFull => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("field too long on line {}", reader.line()),
                    ));
                }
                ReadFieldResult::Field { record_end } => {
                    let field = str::from_utf8(&fieldbuf[..fieldlen])
                        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                    fieldlen = 0;

                    let in_header = header && names.is_none();
                    if in_header {
                        header_fields.push(field.to_string());
                    } else if weighted && count.is_none() {
                        let n: f64 = field.parse().map_err(|_| {
                            io::Error::new(
                                io::ErrorKind::InvalidData,
                                format!("invalid count {:?} on line {}", field, reader.line()),
                            )
                        })?;
                        count = Some(n);
                    } else {
                        record.push(rodeo.get_or_intern(field));
                    }

                    if record_end {
                        if in_header {
                            if weighted && !header_fields.is_empty() {
                                header_fields.remove(0);
                            }
                            names = Some(mem::take(&mut header_fields));
                        } else {
                            let c = count.take().unwrap_or(1.0);
                            if c != 0.0 {
                                *counts.entry(mem::take(&mut record)).or_insert(0.0) += c;
                            }
                            record.clear();
                        }
                    }
                }
                ReadFieldResult::End => {
                    debug!(distinct = counts.len(), "read input");
                    let resolver = rodeo.into_resolver();
                    let rows = counts
                        .into_iter()
                        .map(|(record, count)| {
                            let key: Key = record
                                .iter()
                                .map(|spur| Value::parse(resolver.resolve(spur)))
                                .collect();
                            (key, count)
                        })
                        .collect();
                    return Ok(Records { names, rows });
                }
            }
        }
    }
}

fn print_table(table: &Table, delimiter: &str) {
    println!("{}{}weight", table.names().join(delimiter), delimiter);
    for (key, weight) in table.sorted() {
        let fields: Vec<String> = key.iter().map(ToString::to_string).collect();
        println!("{}{}{}", fields.join(delimiter), delimiter, weight);
    }
}

fn print_summary(summary: Summary) {
    println!("  sample size: {}", summary.sample_size);
    println!("  uncertainty: {:.5} bits", summary.uncertainty);
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();
    let delimiter =
        u8::try_from(args.delimiter).context("the delimiter must be a single-byte character")?;

    let records = load_data(io::stdin().lock(), delimiter, !args.no_header, args.weighted)
        .context("failed to read records from stdin")?;
    let mut table = match records.names {
        Some(names) => Table::with_names(records.rows, names)?,
        None => Table::new(records.rows)?,
    };
    table.check_consistency()?;
    table.shrink_to_fit();
    info!(rows = table.len(), columns = ?table.names(), "loaded table");

    let given: Vec<(&str, Value)> = args
        .given
        .iter()
        .map(|(name, value)| (name.as_str(), Value::parse(value)))
        .collect();
    let sum_out: Vec<&str> = args.sum_out.iter().map(String::as_str).collect();
    let table = table.reduce(&given)?.marginal(&sum_out, false)?;

    let separator = args.delimiter.to_string();
    if args.condition_on.is_empty() {
        let summary = table.summary();
        let table = if args.raw { table } else { table.normalised() };
        print_table(&table, &separator);
        print_summary(summary);
        return Ok(());
    }

    let condition_on: Vec<&str> = args.condition_on.iter().map(String::as_str).collect();
    let conditional = table.condition_on(&condition_on, false)?;
    for (key, partition) in conditional.sorted() {
        let given: Vec<String> = conditional
            .columns()
            .named_key(key)
            .into_iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect();
        println!();
        println!("given {}:", given.join(", "));
        let summary = partition.summary();
        if args.raw {
            print_table(partition, &separator);
        } else {
            print_table(&partition.normalised(), &separator);
        }
        print_summary(summary);
    }
    Ok(())
}
