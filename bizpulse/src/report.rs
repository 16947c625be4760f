//! The `report` subcommand: build a filter, run one analytics view, render it.

use anyhow::{bail, Result};
use bizpulse_core::analytics::productivity::Bottleneck;
use bizpulse_core::analytics::{
    AnalyticsEngine, AnalyticsFilter, AnalyticsReport, AnalyticsView, ClientAnalytics, DateRange,
    OverviewAnalytics, ProductivityAnalytics, ProjectPerformanceAnalytics, RevenueAnalytics,
    TimeAnalytics, TrendAnalytics,
};
use bizpulse_core::format::{format_currency, format_delta};
use chrono::{DateTime, Utc};
use clap::Args;

use crate::args::{parse_date_end, parse_date_start};
use crate::{print_json, CliContext, OutputFormat};

#[derive(Args)]
pub struct ReportArgs {
    /// overview, revenue, productivity, clients, performance, time or trends
    view: AnalyticsView,

    /// Only records created on or after this day (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_start)]
    from: Option<DateTime<Utc>>,

    /// Only records created on or before this day (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date_end)]
    to: Option<DateTime<Utc>>,

    /// Restrict to a project (repeatable)
    #[arg(long = "project")]
    projects: Vec<String>,

    /// Restrict to a client (repeatable)
    #[arg(long = "client")]
    clients: Vec<String>,

    /// Restrict to a user (repeatable)
    #[arg(long = "user")]
    users: Vec<String>,

    /// Keep cancelled projects and archived clients
    #[arg(long)]
    include_archived: bool,
}

impl ReportArgs {
    /// `None` when no filtering option was given.
    fn filter(&self) -> Result<Option<AnalyticsFilter>> {
        let date_range = match (self.from, self.to) {
            (None, None) => None,
            (from, to) => {
                let start = from.unwrap_or(DateTime::<Utc>::MIN_UTC);
                let end = to.unwrap_or(DateTime::<Utc>::MAX_UTC);
                if start > end {
                    bail!("--from must not be after --to");
                }
                Some(DateRange::new(start, end))
            }
        };

        let unfiltered = date_range.is_none()
            && self.projects.is_empty()
            && self.clients.is_empty()
            && self.users.is_empty()
            && !self.include_archived;
        if unfiltered {
            return Ok(None);
        }

        Ok(Some(AnalyticsFilter {
            date_range,
            projects: self.projects.iter().cloned().collect(),
            clients: self.clients.iter().cloned().collect(),
            users: self.users.iter().cloned().collect(),
            include_archived: self.include_archived,
        }))
    }
}

pub fn run(ctx: &CliContext, args: ReportArgs) -> Result<()> {
    let filter = args.filter()?;
    let engine = AnalyticsEngine::new(ctx.config.analytics.clone());
    let snapshot = ctx.workspace.snapshot();
    let report = engine.report(args.view, &snapshot, filter.as_ref(), Utc::now());

    match ctx.format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Text => {
            if snapshot.is_empty() {
                println!("No records yet. Add clients and log time to see analytics.\n");
            }
            render(&report);
            Ok(())
        }
    }
}

fn render(report: &AnalyticsReport) {
    match report {
        AnalyticsReport::Overview(o) => render_overview(o),
        AnalyticsReport::Revenue(r) => render_revenue(r),
        AnalyticsReport::Productivity(p) => render_productivity(p),
        AnalyticsReport::Clients(c) => render_clients(c),
        AnalyticsReport::Performance(p) => render_performance(p),
        AnalyticsReport::Time(t) => render_time(t),
        AnalyticsReport::Trends(t) => render_trends(t),
    }
}

fn header(title: &str) {
    println!("{}", title);
    println!("{}", "=".repeat(title.len()));
}

fn render_overview(o: &OverviewAnalytics) {
    header("Overview");
    println!(
        "Projects:      {} active, {} completed, {} total",
        o.active_projects, o.completed_projects, o.total_projects
    );
    println!("Clients:       {} active, {} total", o.active_clients, o.total_clients);
    println!(
        "Tasks:         {} open, {} overdue, {} total",
        o.open_tasks, o.overdue_tasks, o.total_tasks
    );
    println!(
        "Hours:         {:.2} total, {:.2} billable, {:.2} non-billable",
        o.total_hours, o.billable_hours, o.non_billable_hours
    );
    println!("Utilization:   {:.2}%", o.utilization);
    println!("Revenue:       {}", format_currency(o.total_revenue));
    println!(
        "This month:    {} ({} vs last month)",
        format_currency(o.monthly_revenue),
        format_delta(o.revenue_growth)
    );
}

fn render_revenue(r: &RevenueAnalytics) {
    header("Revenue");
    println!("Total:              {}", format_currency(r.total_revenue));
    println!(
        "This month:         {} ({})",
        format_currency(r.monthly_revenue),
        format_delta(r.revenue_growth)
    );
    println!("Average rate:       {}/h", format_currency(r.average_hourly_rate));
    println!(
        "Non-billable cost:  {} ({:.2}h, estimated)",
        format_currency(r.non_billable_cost),
        r.non_billable_hours
    );

    println!("\nBy month:");
    for m in &r.by_month {
        println!(
            "  {}  {:>14}  {:>8.2}h billable",
            m.month,
            format_currency(m.revenue),
            m.billable_hours
        );
    }

    println!("\nBy client:");
    for c in &r.by_client {
        println!(
            "  {:<24}  {:>14}  {} project(s)",
            c.client_name,
            format_currency(c.revenue),
            c.project_count
        );
    }

    println!("\nTop projects by profitability:");
    for (i, p) in r.top_performing_projects.iter().enumerate() {
        println!(
            "  {}. {:<24}  {:>14}  {:>7.2}%",
            i + 1,
            p.title,
            format_currency(p.revenue),
            p.profitability
        );
    }
}

fn render_bottleneck(b: &Bottleneck) {
    println!("  [{:?}] {}", b.impact, b.description);
}

fn render_productivity(p: &ProductivityAnalytics) {
    header("Productivity");
    println!(
        "Tasks:                {} completed of {} ({:.2}%)",
        p.completed_tasks, p.total_tasks, p.completion_rate
    );
    println!("Avg completion time:  {:.2} days", p.average_completion_days);
    println!("Avg hours per task:   {:.2}", p.average_hours_per_task);
    println!(
        "Overdue:              {} ({:.2}%)",
        p.overdue_tasks, p.overdue_percentage
    );
    println!("On-time delivery:     {:.2}%", p.project_delivery_rate);

    println!("\nStatus:");
    for s in &p.status_distribution {
        println!("  {:<12} {:>4}  {:>6.2}%", s.status, s.count, s.percentage);
    }

    if !p.bottlenecks.is_empty() {
        println!("\nBottlenecks:");
        for b in &p.bottlenecks {
            render_bottleneck(b);
        }
    }
}

fn render_clients(c: &ClientAnalytics) {
    header("Clients");
    println!(
        "Clients:              {} total, {} active, {} new this month",
        c.total_clients, c.active_clients, c.new_this_month
    );
    println!("Projects per client:  {:.2}", c.average_projects_per_client);
    println!(
        "Revenue per client:   {}",
        format_currency(c.average_revenue_per_client)
    );

    println!("\nStatus:");
    for s in &c.status_distribution {
        println!("  {:<10} {:>4}  {:>6.2}%", s.status, s.count, s.percentage);
    }

    println!("\nTop clients:");
    for (i, client) in c.top_clients.iter().enumerate() {
        println!(
            "  {}. {:<24}  {:>14}",
            i + 1,
            client.client_name,
            format_currency(client.revenue)
        );
    }

    println!("\nAcquisition:");
    for m in &c.acquisition {
        println!("  {}  {}", m.month, m.count);
    }
}

fn render_performance(p: &ProjectPerformanceAnalytics) {
    header("Project performance");
    println!("Projects:           {}", p.total_projects);
    println!("On-time delivery:   {:.2}%", p.on_time_delivery);
    println!("Budget adherence:   {:.2}%", p.budget_adherence);
    println!("Avg duration:       {:.2} days", p.average_duration_days);
    println!("Total profit:       {}", format_currency(p.total_profit));

    println!("\nProfitability:");
    for row in &p.profitability {
        println!(
            "  {:<24}  {:>14}  {:>7.2}%",
            row.title,
            format_currency(row.profit),
            row.margin
        );
    }

    if !p.over_budget.is_empty() {
        println!("\nOver budget:");
        for row in &p.over_budget {
            println!("  {:<24}  +{}", row.title, format_currency(row.overrun));
        }
    }

    println!("\nStatus:");
    for s in &p.status_distribution {
        println!("  {:<10} {:>4}  {:>6.2}%", s.status, s.count, s.percentage);
    }
}

fn render_time(t: &TimeAnalytics) {
    header("Time");
    println!(
        "Hours:  {:.2} total, {:.2} billable, {:.2} non-billable",
        t.total_hours, t.billable_hours, t.non_billable_hours
    );

    println!("\nMonthly:");
    for m in &t.monthly_breakdown {
        println!(
            "  {}  {:>8.2}h  {:>3} days  {:>6.2}h/day  {:>6.2}h overtime",
            m.month, m.total_hours, m.active_days, m.average_daily_hours, m.overtime_hours
        );
    }

    println!("\nWeekly:");
    for w in &t.weekly_trends {
        println!(
            "  {}  {:>8.2}h  {:>14}  {}/h",
            w.week,
            w.hours,
            format_currency(w.revenue),
            format_currency(w.efficiency)
        );
    }

    println!("\nProject allocation:");
    for p in &t.project_allocation {
        println!(
            "  {:<24}  {:>8.2}h of {:>8.2}h  ({:+.2}h)",
            p.title, p.actual_hours, p.allocated_hours, p.variance
        );
    }

    let o = &t.overtime;
    println!(
        "\nOvertime: {:.2}h ({:.2}%), {} long entries, estimated cost {}",
        o.total_overtime_hours,
        o.overtime_percentage,
        o.entries_over_threshold,
        format_currency(o.estimated_cost)
    );
}

fn render_trends(t: &TrendAnalytics) {
    header("Trends");

    println!("Revenue:");
    for p in &t.revenue_trend {
        println!(
            "  {}  {:>14}  {}",
            p.period,
            format_currency(p.value),
            format_delta(p.growth)
        );
    }

    println!("\nClients (cumulative):");
    for p in &t.client_growth {
        println!("  {}  {:>6}  {}", p.period, p.value, format_delta(p.growth));
    }

    println!("\nNew projects:");
    for p in &t.project_volume {
        println!("  {}  {:>6}  {}", p.period, p.value, format_delta(p.growth));
    }

    println!("\nProductivity:");
    for p in &t.productivity_trend {
        println!(
            "  {}  {:>4} entries  {:>6.2}h avg  {}/h",
            p.month,
            p.entries,
            p.average_hours_per_entry,
            format_currency(p.efficiency)
        );
    }

    println!("\nSeasonality:");
    for s in &t.seasonal_patterns {
        println!(
            "  {}  {:>14}  {:>4} projects  {}",
            s.quarter,
            format_currency(s.revenue),
            s.project_volume,
            s.pattern.as_str()
        );
    }
}
