use analysis_core::{
    keyword_hits, BusinessSegment, ClassificationResult, CompanyData, EvidenceKind,
    MarketDataProvider, PeerSetProvider, SectorId,
};
use std::sync::Arc;

use crate::reference::{known_sector, known_segments};

/// Segments below this share of revenue are folded away
pub const DEFAULT_MATERIALITY_THRESHOLD: f64 = 0.10;

/// A sector needs this many keyword hits to count as a separate line of business
const MIN_DESCRIPTION_HITS: usize = 2;

/// Maps a company to its sector archetype and, for groups, to weighted segments.
///
/// Evidence is tried strongest first: disclosed segment revenue, the
/// known-conglomerate table, keywords in the business description, then a
/// single segment from the provider label, the known-ticker table or GENERIC.
pub struct SectorClassifier {
    market_data: Arc<dyn MarketDataProvider>,
    peer_provider: Option<Arc<dyn PeerSetProvider>>,
    materiality_threshold: f64,
}

impl SectorClassifier {
    pub fn new(market_data: Arc<dyn MarketDataProvider>) -> Self {
        Self {
            market_data,
            peer_provider: None,
            materiality_threshold: DEFAULT_MATERIALITY_THRESHOLD,
        }
    }

    pub fn with_peer_provider(mut self, provider: Arc<dyn PeerSetProvider>) -> Self {
        self.peer_provider = Some(provider);
        self
    }

    pub fn with_materiality_threshold(mut self, threshold: f64) -> Self {
        self.materiality_threshold = threshold.clamp(0.0, 0.5);
        self
    }

    pub fn materiality_threshold(&self) -> f64 {
        self.materiality_threshold
    }

    /// Classifies `ticker`. Never fails: provider errors count as missing data.
    pub async fn classify(&self, ticker: &str, include_peers: bool) -> ClassificationResult {
        let company = match self.market_data.company_data(ticker).await {
            Ok(company) => company,
            Err(e) => {
                tracing::warn!("Company data unavailable for {}: {}", ticker, e);
                CompanyData::new(ticker)
            }
        };

        let mut result = self.classify_from(ticker, &company);
        if include_peers {
            result.peer_tickers = self.peer_tickers(ticker, result.primary_sector).await;
        }
        result
    }

    /// Classification from an already fetched snapshot; no peer lookup.
    pub fn classify_from(&self, ticker: &str, company: &CompanyData) -> ClassificationResult {
        let (evidence, confidence, raw) = self.collect_evidence(ticker, company);
        let segments = finalize_segments(raw, self.materiality_threshold);

        let primary_sector = segments
            .first()
            .map(|s| s.sector)
            .unwrap_or(SectorId::Generic);
        let is_conglomerate = segments
            .iter()
            .filter(|s| s.revenue_contribution + 1e-9 >= self.materiality_threshold)
            .count()
            >= 2;

        tracing::info!(
            "Classified {} as {} ({:?}, {} segment(s), confidence {:.0})",
            ticker,
            primary_sector,
            evidence,
            segments.len(),
            confidence
        );

        ClassificationResult {
            ticker: ticker.to_string(),
            company_name: company.name.clone(),
            primary_sector,
            is_conglomerate,
            segments,
            confidence,
            evidence,
            peer_tickers: Vec::new(),
        }
    }

    fn collect_evidence(
        &self,
        ticker: &str,
        company: &CompanyData,
    ) -> (EvidenceKind, f64, Vec<BusinessSegment>) {
        let label_sector = label_sector(company);

        // (a) disclosed revenue splits
        let disclosed: Vec<BusinessSegment> = company
            .segment_revenues
            .iter()
            .filter(|s| s.revenue.is_finite() && s.revenue > 0.0)
            .map(|s| {
                let sector = SectorId::from_label(&s.name)
                    .or(label_sector)
                    .unwrap_or(SectorId::Generic);
                BusinessSegment::new(sector, s.name.clone(), s.revenue)
            })
            .collect();
        if !disclosed.is_empty() {
            return (EvidenceKind::DisclosedSegments, 90.0, disclosed);
        }

        // (b) reference table
        if let Some(known) = known_segments(ticker) {
            let segments = known
                .iter()
                .map(|(sector, label, share)| BusinessSegment::new(*sector, *label, *share))
                .collect();
            return (EvidenceKind::KnownConglomerate, 80.0, segments);
        }

        // (c) business description, only when it names several businesses
        let description_hits = company
            .business_summary
            .as_deref()
            .map(keyword_hits)
            .unwrap_or_default();
        let strong: Vec<(SectorId, usize)> = description_hits
            .iter()
            .copied()
            .filter(|(sector, hits)| *hits >= MIN_DESCRIPTION_HITS && *sector != SectorId::Generic)
            .collect();
        if strong.len() >= 2 {
            let segments = strong
                .iter()
                .map(|(sector, hits)| {
                    BusinessSegment::new(*sector, sector.display_name(), *hits as f64)
                })
                .collect();
            return (EvidenceKind::BusinessDescription, 55.0, segments);
        }

        // (d) single segment
        if let Some(sector) = label_sector {
            let label = company
                .industry
                .clone()
                .or_else(|| company.sector.clone())
                .unwrap_or_else(|| sector.display_name().to_string());
            return (
                EvidenceKind::SectorLabel,
                75.0,
                vec![BusinessSegment::new(sector, label, 1.0)],
            );
        }
        if let Some(sector) = known_sector(ticker) {
            return (
                EvidenceKind::KnownTicker,
                70.0,
                vec![BusinessSegment::new(sector, sector.display_name(), 1.0)],
            );
        }
        if let Some((sector, _)) = description_hits.first() {
            return (
                EvidenceKind::BusinessDescription,
                45.0,
                vec![BusinessSegment::new(*sector, sector.display_name(), 1.0)],
            );
        }

        tracing::warn!("No sector evidence for {}, using {}", ticker, SectorId::Generic);
        (
            EvidenceKind::Fallback,
            20.0,
            vec![BusinessSegment::new(
                SectorId::Generic,
                SectorId::Generic.display_name(),
                1.0,
            )],
        )
    }

    async fn peer_tickers(&self, ticker: &str, sector: SectorId) -> Vec<String> {
        let Some(provider) = &self.peer_provider else {
            return Vec::new();
        };
        match provider.peers(ticker, sector).await {
            Ok(data) => data
                .peers
                .into_iter()
                .map(|p| p.ticker)
                .filter(|t| !t.eq_ignore_ascii_case(ticker))
                .collect(),
            Err(e) => {
                tracing::warn!("Peer lookup failed for {}: {}", ticker, e);
                Vec::new()
            }
        }
    }
}

/// Sector from the provider's sector label, falling back to the industry label.
fn label_sector(company: &CompanyData) -> Option<SectorId> {
    [company.sector.as_deref(), company.industry.as_deref()]
        .into_iter()
        .flatten()
        .find_map(SectorId::from_label)
}

/// Merges same-sector entries, applies the materiality threshold and
/// renormalizes so the kept contributions sum to 1, largest first.
///
/// Input weights may be in any unit (revenue, keyword hits, fractions).
pub fn finalize_segments(raw: Vec<BusinessSegment>, threshold: f64) -> Vec<BusinessSegment> {
    let mut merged: Vec<BusinessSegment> = Vec::new();
    for segment in raw {
        if !(segment.revenue_contribution.is_finite() && segment.revenue_contribution > 0.0) {
            continue;
        }
        match merged.iter_mut().find(|m| m.sector == segment.sector) {
            Some(existing) => {
                existing.revenue_contribution += segment.revenue_contribution;
                existing.label = format!("{} & {}", existing.label, segment.label);
            }
            None => merged.push(segment),
        }
    }

    normalize(&mut merged);
    let largest = merged
        .iter()
        .max_by(|a, b| a.revenue_contribution.total_cmp(&b.revenue_contribution))
        .cloned();

    let mut kept: Vec<BusinessSegment> = merged
        .into_iter()
        .filter(|s| s.revenue_contribution + 1e-9 >= threshold)
        .collect();
    if kept.is_empty() {
        kept.extend(largest);
    }

    normalize(&mut kept);
    kept.sort_by(|a, b| {
        b.revenue_contribution
            .total_cmp(&a.revenue_contribution)
            .then(a.sector.cmp(&b.sector))
    });
    kept
}

fn normalize(segments: &mut [BusinessSegment]) {
    let total: f64 = segments.iter().map(|s| s.revenue_contribution).sum();
    if total > 0.0 {
        for s in segments.iter_mut() {
            s.revenue_contribution /= total;
        }
    }
}
