//! Plain-text rendering for the terminal.

use serpwatch_check::{CheckParams, CheckReport};
use serpwatch_core::{
  history::{CompetitorSnapshot, KeywordStatus},
  keyword::Keyword,
};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn print_report(report: &CheckReport, params: &CheckParams) {
  println!(
    "{}: {} of {} keywords checked (run {})",
    report.target_domain, report.completed, report.submitted, report.run_id
  );

  if !report.dropped.is_empty() {
    println!("\nDropped:");
    for d in &report.dropped {
      println!(
        "  {}  {} -> {} (-{})  {}",
        d.keyword,
        d.previous_rank,
        d.current_rank,
        d.magnitude(),
        d.url
      );
      for c in &d.competitors_above {
        println!("      #{:<3} {}", c.rank, c.url);
      }
    }
  }

  if !report.out_of_window.is_empty() {
    println!("\nOut of the top {}:", params.depth);
    for v in &report.out_of_window {
      println!(
        "  {}  was {}  {}",
        v.keyword,
        v.previous_rank,
        v.last_url.as_deref().unwrap_or("-")
      );
    }
  }

  let candidates = report.analysis_candidates(params.max_analysis_keywords);
  if !candidates.is_empty() {
    let names: Vec<&str> = candidates.iter().map(|d| d.keyword.as_str()).collect();
    println!("\nCompetitor analysis candidates: {}", names.join(", "));
  }

  if !report.has_regressions() {
    println!("\nNo regressions.");
  }

  let skipped = [
    ("rejected", report.rejected.len()),
    ("failed", report.failed.len()),
    ("abandoned", report.abandoned.len()),
  ];
  for (label, count) in skipped.into_iter().filter(|(_, n)| *n > 0) {
    println!("{count} keywords {label}; their history was left unchanged.");
  }
}

pub fn print_status(rows: &[KeywordStatus]) {
  for row in rows {
    let (rank, checked) = match &row.record {
      Some(r) => (
        r.rank.map_or_else(|| "out".to_string(), |n| n.to_string()),
        r.checked_at.format(TIME_FORMAT).to_string(),
      ),
      None => ("-".to_string(), "never".to_string()),
    };
    println!(
      "{rank:>5}  {:<40}  {:<12}  {checked}",
      row.keyword.phrase,
      row.keyword.genre.as_deref().unwrap_or("")
    );
  }
}

pub fn print_keywords(keywords: &[Keyword]) {
  for k in keywords {
    println!(
      "{:<40}  {:<12}  {}",
      k.phrase,
      k.genre.as_deref().unwrap_or(""),
      k.priority.as_deref().unwrap_or("")
    );
  }
}

pub fn print_competitors(keyword: &str, rows: &[CompetitorSnapshot]) {
  let Some(first) = rows.first() else {
    println!("no competitor snapshot for {keyword:?}");
    return;
  };
  println!("{} as of {}", first.keyword, first.checked_at.format(TIME_FORMAT));
  for c in rows {
    println!("  #{:<3} {}", c.rank, c.url);
  }
}
