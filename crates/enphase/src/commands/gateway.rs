//! Gateway query handlers.

use tabled::Tabled;

use enphase_api::{Inverter, Meter};

use crate::error::CliError;
use crate::output;

use super::Context;

#[derive(Tabled)]
struct MeterRow {
    #[tabled(rename = "EID")]
    eid: u64,
    #[tabled(rename = "Type")]
    measurement_type: String,
}

impl From<&Meter> for MeterRow {
    fn from(m: &Meter) -> Self {
        Self {
            eid: m.eid,
            measurement_type: m.measurement_type.clone(),
        }
    }
}

#[derive(Tabled)]
struct InverterRow {
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "Part")]
    part: String,
    #[tabled(rename = "Producing")]
    producing: String,
    #[tabled(rename = "Communicating")]
    communicating: String,
    #[tabled(rename = "Phase")]
    phase: String,
}

impl From<&Inverter> for InverterRow {
    fn from(i: &Inverter) -> Self {
        Self {
            serial: i.serial_number.clone(),
            part: i.part_number.clone(),
            producing: yes_no(i.producing),
            communicating: yes_no(i.communicating),
            phase: i.phase.clone().unwrap_or_else(|| "-".into()),
        }
    }
}

fn yes_no(flag: Option<bool>) -> String {
    let text = match flag {
        Some(true) => "yes",
        Some(false) => "no",
        None => "-",
    };
    text.into()
}

pub async fn meters(ctx: &Context<'_>) -> Result<(), CliError> {
    let meters = ctx.client.list_meters().await?;
    let out = output::render_list(
        ctx.output,
        &meters,
        |m| MeterRow::from(m),
        |m| m.eid.to_string(),
    )?;
    output::print_output(&out, ctx.global.quiet);
    Ok(())
}

pub async fn inverters(ctx: &Context<'_>) -> Result<(), CliError> {
    let inverters = ctx.client.list_inverters().await?;
    let out = output::render_list(
        ctx.output,
        &inverters,
        |i| InverterRow::from(i),
        |i| i.serial_number.clone(),
    )?;
    output::print_output(&out, ctx.global.quiet);
    Ok(())
}

pub async fn readings(ctx: &Context<'_>) -> Result<(), CliError> {
    let raw = ctx.client.meter_readings().await?;
    print_raw(ctx, &raw)
}

pub async fn production(ctx: &Context<'_>) -> Result<(), CliError> {
    let raw = ctx.client.main_production().await?;
    print_raw(ctx, &raw)
}

pub async fn inverter_production(ctx: &Context<'_>) -> Result<(), CliError> {
    let raw = ctx.client.inverter_production().await?;
    print_raw(ctx, &raw)
}

pub async fn get(ctx: &Context<'_>, path: &str) -> Result<(), CliError> {
    let raw = ctx.client.authenticated_get(path).await?;
    print_raw(ctx, &raw)
}

fn print_raw(ctx: &Context<'_>, raw: &serde_json::Value) -> Result<(), CliError> {
    let out = output::render_raw(ctx.output, raw)?;
    output::print_output(&out, ctx.global.quiet);
    Ok(())
}
