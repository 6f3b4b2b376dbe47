//! Rank observations and the normaliser that builds them from result listings.

use serde::{Deserialize, Serialize};

use crate::{domain::DomainMatcher, serp::SerpEntry};

/// A URL at a ranked position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedUrl {
  pub rank: u32,
  pub url:  String,
}

impl RankedUrl {
  pub fn new(rank: u32, url: impl Into<String>) -> Self {
    Self { rank, url: url.into() }
  }
}

// ─── RankObservation ─────────────────────────────────────────────────────────

/// A point-in-time measurement of one keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankObservation {
  pub keyword:           String,
  /// Best position of the tracked domain. `None` means it was not found
  /// within the requested depth, not that it ranks nowhere.
  pub own:               Option<RankedUrl>,
  /// Every organic entry not on the tracked domain, ascending by rank.
  pub competitors:       Vec<RankedUrl>,
  /// Competitors ranked strictly above `own`, capped for display. Empty when
  /// `own` is `None`.
  pub competitors_above: Vec<RankedUrl>,
}

impl RankObservation {
  pub fn rank(&self) -> Option<u32> { self.own.as_ref().map(|o| o.rank) }

  pub fn url(&self) -> Option<&str> { self.own.as_ref().map(|o| o.url.as_str()) }

  pub fn is_out_of_window(&self) -> bool { self.own.is_none() }
}

// ─── Normaliser ──────────────────────────────────────────────────────────────

/// Turns a raw result listing into a [`RankObservation`] for one tracked
/// domain.
#[derive(Debug, Clone)]
pub struct ResultNormalizer {
  matcher:               DomainMatcher,
  max_competitors_above: usize,
}

impl ResultNormalizer {
  pub fn new(target_domain: &str, max_competitors_above: usize) -> Self {
    Self { matcher: DomainMatcher::new(target_domain), max_competitors_above }
  }

  pub fn target_domain(&self) -> &str { self.matcher.target() }

  /// Scan `entries` and derive the tracked domain's best position plus the
  /// competitor list.
  ///
  /// Entries that are not organic, or lack a rank or URL, are ignored.
  pub fn normalize(&self, keyword: impl Into<String>, entries: &[SerpEntry]) -> RankObservation {
    let mut own: Option<RankedUrl> = None;
    let mut competitors = Vec::new();

    for entry in entries.iter().filter(|e| e.is_organic()) {
      let (Some(rank), Some(url)) = (entry.rank(), entry.url.as_deref()) else {
        continue;
      };
      if url.is_empty() {
        continue;
      }

      if self.matcher.matches(url) {
        if own.as_ref().is_none_or(|o| rank < o.rank) {
          own = Some(RankedUrl::new(rank, url));
        }
      } else {
        competitors.push(RankedUrl::new(rank, url));
      }
    }

    competitors.sort_by_key(|c| c.rank);

    let competitors_above = match &own {
      Some(o) => competitors
        .iter()
        .filter(|c| c.rank < o.rank)
        .take(self.max_competitors_above)
        .cloned()
        .collect(),
      None => Vec::new(),
    };

    RankObservation { keyword: keyword.into(), own, competitors, competitors_above }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn normalizer(cap: usize) -> ResultNormalizer { ResultNormalizer::new("example.com", cap) }

  fn ranks(list: &[RankedUrl]) -> Vec<u32> { list.iter().map(|c| c.rank).collect() }

  #[test]
  fn own_rank_with_competitors_on_both_sides() {
    let entries = vec![
      SerpEntry::organic(1, "https://a.test/"),
      SerpEntry::organic(2, "https://b.test/"),
      SerpEntry::organic(3, "https://www.example.com/page"),
      SerpEntry::organic(4, "https://c.test/"),
      SerpEntry::organic(5, "https://d.test/"),
    ];
    let obs = normalizer(3).normalize("kw", &entries);

    assert_eq!(obs.rank(), Some(3));
    assert_eq!(obs.url(), Some("https://www.example.com/page"));
    assert_eq!(ranks(&obs.competitors_above), vec![1, 2]);
    assert_eq!(ranks(&obs.competitors), vec![1, 2, 4, 5]);
  }

  #[test]
  fn competitors_above_is_capped_but_full_list_kept() {
    let mut entries: Vec<SerpEntry> = (1..=6)
      .map(|r| SerpEntry::organic(r, format!("https://c{r}.test/")))
      .collect();
    entries.push(SerpEntry::organic(7, "https://example.com/"));
    let obs = normalizer(3).normalize("kw", &entries);

    assert_eq!(ranks(&obs.competitors_above), vec![1, 2, 3]);
    assert_eq!(obs.competitors.len(), 6);
  }

  #[test]
  fn absent_domain_is_out_of_window() {
    let entries = vec![
      SerpEntry::organic(1, "https://a.test/"),
      SerpEntry::organic(2, "https://b.test/"),
    ];
    let obs = normalizer(3).normalize("kw", &entries);

    assert!(obs.is_out_of_window());
    assert_eq!(obs.rank(), None);
    assert_eq!(obs.url(), None);
    assert!(obs.competitors_above.is_empty());
    assert_eq!(obs.competitors.len(), 2);
  }

  #[test]
  fn best_own_position_wins() {
    let entries = vec![
      SerpEntry::organic(6, "https://example.com/second"),
      SerpEntry::organic(1, "https://a.test/"),
      SerpEntry::organic(2, "https://blog.example.com/first"),
    ];
    let obs = normalizer(3).normalize("kw", &entries);

    assert_eq!(obs.rank(), Some(2));
    assert_eq!(obs.url(), Some("https://blog.example.com/first"));
    assert_eq!(ranks(&obs.competitors), vec![1]);
  }

  #[test]
  fn non_organic_and_incomplete_entries_are_ignored() {
    let entries = vec![
      SerpEntry {
        kind: Some("paid".into()),
        ..SerpEntry::organic(1, "https://example.com/ad")
      },
      SerpEntry { url: None, ..SerpEntry::organic(2, "") },
      SerpEntry {
        rank_absolute: None,
        ..SerpEntry::organic(0, "https://norank.test/")
      },
      SerpEntry::organic(3, "https://a.test/"),
      SerpEntry::organic(4, "https://example.com/organic"),
    ];
    let obs = normalizer(3).normalize("kw", &entries);

    assert_eq!(obs.rank(), Some(4));
    assert_eq!(ranks(&obs.competitors), vec![3]);
    assert_eq!(ranks(&obs.competitors_above), vec![3]);
  }

  #[test]
  fn unsorted_listing_is_sorted() {
    let entries = vec![
      SerpEntry::organic(9, "https://z.test/"),
      SerpEntry::organic(2, "https://b.test/"),
      SerpEntry::organic(5, "https://e.test/"),
    ];
    let obs = normalizer(3).normalize("kw", &entries);
    assert_eq!(ranks(&obs.competitors), vec![2, 5, 9]);
  }
}
