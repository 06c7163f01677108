use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use log::{error, info, warn};
use std::{str::FromStr, thread::sleep, time::Duration};
use thermochron::{
    Config, ControlRegister, Ds1921Driver, FAILURE_TEMPERATURE, FAMILY_CODE, Line,
    gpio::{DEFAULT_PIN, GpioLine},
};

fn get_param<T>(matches: &ArgMatches, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    matches
        .value_of(name)
        .map(|value| {
            value
                .parse()
                .with_context(|| format!("invalid parameter {name}: {value:?}"))
        })
        .transpose()
}

fn app() -> App<'static, 'static> {
    App::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .about("ds1921 thermochron on a bit-banged 1-Wire GPIO line")
        .setting(AppSettings::VersionlessSubcommands)
        .arg(
            Arg::with_name("pin")
                .long("pin")
                .takes_value(true)
                .global(true)
                .help("BCM GPIO number of the 1-Wire line [default: 23]"),
        )
        .arg(
            Arg::with_name("conversion-time")
                .long("conversion-time")
                .takes_value(true)
                .global(true)
                .help("Wait after convert temperature (us)"),
        )
        .arg(
            Arg::with_name("commit-time")
                .long("commit-time")
                .takes_value(true)
                .global(true)
                .help("Wait after copy scratchpad (us)"),
        )
        .subcommand(
            SubCommand::with_name("poll")
                .about("Print time, id and temperature periodically (default)")
                .arg(
                    Arg::with_name("interval")
                        .long("interval")
                        .takes_value(true)
                        .help("Seconds between readings [default: 300]"),
                ),
        )
        .subcommand(SubCommand::with_name("temperature").about("One-shot conversion"))
        .subcommand(SubCommand::with_name("set-rtc").about("Set the RTC from the local time"))
        .subcommand(SubCommand::with_name("clear").about("Clear the mission memory"))
        .subcommand(
            SubCommand::with_name("start-mission")
                .about("Clear memory, set the RTC and start a mission")
                .arg(
                    Arg::with_name("delay")
                        .long("delay")
                        .takes_value(true)
                        .help("Mission start delay (minutes) [default: 0]"),
                )
                .arg(
                    Arg::with_name("rollover")
                        .long("rollover")
                        .help("Overwrite the oldest samples once the log is full"),
                )
                .arg(
                    Arg::with_name("no-clear")
                        .long("no-clear")
                        .help("Do not clear memory first"),
                ),
        )
}

fn poll<L: Line>(thermochron: &mut Ds1921Driver<L>, interval: Duration) -> ! {
    println!("time, id, temperature");
    loop {
        let time = Local::now().format("%a %b %e %T %Y").to_string();
        let id = match thermochron.rom() {
            Ok(rom) => {
                if rom.family_code() != FAMILY_CODE {
                    warn!("unexpected family code {:#04x}", rom.family_code());
                }
                rom.to_string()
            }
            Err(error) => {
                error!("read rom: {error}");
                String::new()
            }
        };
        let temperature = thermochron.temperature().unwrap_or_else(|error| {
            error!("temperature: {error}");
            FAILURE_TEMPERATURE
        });
        println!("{time:>20}, {id}, {temperature:.1}");
        sleep(interval);
    }
}

fn main_app() -> Result<()> {
    let matches = app().get_matches();
    let pin = get_param(&matches, "pin")?.unwrap_or(DEFAULT_PIN);
    let mut config = Config::default();
    if let Some(conversion_time_us) = get_param(&matches, "conversion-time")? {
        config.conversion_time_us = conversion_time_us;
    }
    if let Some(commit_time_us) = get_param(&matches, "commit-time")? {
        config.commit_time_us = commit_time_us;
    }

    let line = GpioLine::new(pin).with_context(|| format!("GPIO {pin}"))?;
    let mut thermochron = Ds1921Driver::with_config(line, config);
    info!("Thermochron initialized on GPIO {pin}");

    match matches.subcommand() {
        ("poll", sub_m) => {
            let interval = match sub_m {
                Some(sub_m) => get_param(sub_m, "interval")?,
                None => None,
            };
            poll(&mut thermochron, Duration::from_secs(interval.unwrap_or(300)))
        }
        ("", _) => poll(&mut thermochron, Duration::from_secs(300)),
        ("temperature", _) => {
            println!("{:.1}", thermochron.temperature()?);
        }
        ("set-rtc", _) => {
            thermochron.set_rtc_now()?;
            info!("RTC set");
        }
        ("clear", _) => {
            thermochron.clear_memory()?;
            info!("Memory cleared");
        }
        ("start-mission", Some(sub_m)) => {
            let delay = get_param(sub_m, "delay")?.unwrap_or(0);
            if !sub_m.is_present("no-clear") {
                thermochron.clear_memory().context("clear memory")?;
            }
            thermochron.set_rtc_now().context("set rtc")?;
            let control = ControlRegister {
                rollover: sub_m.is_present("rollover"),
                ..Default::default()
            };
            thermochron
                .start_mission(control, delay)
                .context("start mission")?;
            info!("Mission started, delay {delay} minutes");
        }
        (name, _) => bail!("unknown subcommand {name}"),
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(error) = main_app() {
        error!("Error: {error:#}");
        std::process::exit(1);
    }
}
