//! `billdesk-dashboard [FROM] [TO]` — fetch invoices and plans and print the
//! dashboard KPIs as JSON. Dates are `YYYY-MM-DD`; both bounds are optional.

use anyhow::Context;
use chrono::{NaiveDate, Utc};

use billdesk_client::{ApiClient, ClientConfig};
use billdesk_reporting::{aging_buckets, revenue_by_month, DashboardKpis, DateRange};

fn parse_date(arg: Option<String>) -> anyhow::Result<Option<NaiveDate>> {
    arg.map(|raw| {
        NaiveDate::parse_from_str(&raw, "%Y-%m-%d").with_context(|| format!("invalid date '{raw}'"))
    })
    .transpose()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    billdesk_observability::init();

    let mut args = std::env::args().skip(1);
    let range = DateRange::new(parse_date(args.next())?, parse_date(args.next())?)?;

    let config = ClientConfig::from_env()?;
    tracing::info!(api = %config.base_url, "loading dashboard");
    let client = ApiClient::new(config)?;

    let (invoices, plans) = tokio::try_join!(client.list_all_invoices(None), client.list_plans())?;

    let invoice_rows = invoices
        .iter()
        .map(|i| i.to_snapshot())
        .collect::<Result<Vec<_>, _>>()?;
    let plan_rows = plans
        .iter()
        .map(|p| p.to_snapshot())
        .collect::<Result<Vec<_>, _>>()?;
    let today = Utc::now().date_naive();

    let kpis = DashboardKpis::compute(&invoice_rows, &plan_rows, range, today)?.rounded(2);
    tracing::info!(
        invoices = kpis.invoice_count,
        overdue = kpis.overdue_count,
        active_plans = kpis.active_plans,
        "dashboard computed"
    );

    let aging = aging_buckets(&invoice_rows, today)?;
    let revenue = revenue_by_month(&invoice_rows, range)?;
    let report = serde_json::json!({
        "range": range,
        "today": today,
        "kpis": kpis,
        "aging": aging,
        "revenueByMonth": revenue,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
