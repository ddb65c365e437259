use std::env;
use anyhow::{anyhow, bail, Context};
use chrono::{TimeDelta, Utc};
use log::{error, info};
use once_cell::sync::Lazy;
use forms_ticket::common::setup;
use forms_ticket::{MachineKeyConfig, Ticket, TicketCodec};

static TICKET_LIFETIME_MINUTES: Lazy<i64> = Lazy::new(|| {
    env::var("TICKET_LIFETIME_MINUTES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(30)
});

static TICKET_VERSION: Lazy<i32> = Lazy::new(|| {
    env::var("TICKET_VERSION")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(2)
});

static COOKIE_PATH: Lazy<String> = Lazy::new(|| {
    env::var("TICKET_COOKIE_PATH")
        .ok()
        .unwrap_or("/".to_owned())
});

const USAGE: &str = "usage: forms_ticket encrypt <name> [minutes] [user-data] | forms_ticket decrypt <hex>";

fn encrypt(codec: &TicketCodec, args: &[String]) -> anyhow::Result<()>{
    let name = args.first().ok_or_else(|| anyhow!(USAGE))?;

    let minutes = match args.get(1){
        Some(m) => m.parse().context("minutes must be a number")?,
        None => *TICKET_LIFETIME_MINUTES,
    };

    let user_data = args.get(2).map(String::as_str).unwrap_or("");

    let issued = Utc::now();
    let lifetime = TimeDelta::try_minutes(minutes).ok_or_else(|| anyhow!("lifetime is out of range"))?;

    let ticket = Ticket::new(
        *TICKET_VERSION,
        name.as_str(),
        &issued,
        &(issued + lifetime),
        false,
        user_data,
        COOKIE_PATH.as_str(),
    )?;

    info!("issuing ticket for {} valid until {}", ticket.name(), ticket.expiration_utc());

    println!("{}", codec.encrypt(&ticket)?);

    Ok(())
}

fn decrypt(codec: &TicketCodec, args: &[String]) -> anyhow::Result<()>{
    let encrypted = args.first().ok_or_else(|| anyhow!(USAGE))?;

    let ticket = match codec.decrypt(encrypted){
        Ok(t) => t,
        Err(e) => {
            error!("{}", e);
            bail!(e);
        }
    };

    println!("version:     {}", ticket.version());
    println!("name:        {:?}", ticket.name());
    println!("issued:      {} ({})", ticket.issue_date_utc(), ticket.issue_date());
    println!("expires:     {} ({})", ticket.expiration_utc(), ticket.expiration());
    println!("expired:     {}", ticket.expired());
    println!("persistent:  {}", ticket.is_persistent());
    println!("user data:   {:?}", ticket.user_data());
    println!("cookie path: {:?}", ticket.cookie_path());

    Ok(())
}

fn main() -> anyhow::Result<()>{
    setup()?;

    let config = MachineKeyConfig::from_env()?;
    info!("using {} with {}", config.decryption, config.validation);

    let codec = TicketCodec::new(&config)?;

    let args: Vec<String> = env::args().skip(1).collect();

    match args.first().map(String::as_str){
        Some("encrypt") => encrypt(&codec, &args[1..]),
        Some("decrypt") => decrypt(&codec, &args[1..]),
        _ => bail!(USAGE),
    }
}
