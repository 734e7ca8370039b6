#[cfg(test)]
mod tests {
    use super::super::classifier::*;
    use analysis_core::{
        AnalysisError, BusinessSegment, CompanyData, EvidenceKind, MarketDataProvider, PeerData,
        PeerRecord, PeerSetProvider, SectorId, SegmentDisclosure,
    };
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;

    struct StaticMarketData(HashMap<String, CompanyData>);

    #[async_trait]
    impl MarketDataProvider for StaticMarketData {
        async fn company_data(&self, ticker: &str) -> Result<CompanyData, AnalysisError> {
            self.0
                .get(ticker)
                .cloned()
                .ok_or_else(|| AnalysisError::ApiError(format!("no data for {ticker}")))
        }
    }

    struct StaticPeers;

    #[async_trait]
    impl PeerSetProvider for StaticPeers {
        async fn peers(&self, _ticker: &str, sector: SectorId) -> Result<PeerData, AnalysisError> {
            match sector {
                SectorId::It => Ok(PeerData::new(vec![
                    PeerRecord {
                        ticker: "INFY.NS".to_string(),
                        ..Default::default()
                    },
                    PeerRecord {
                        ticker: "TCS.NS".to_string(),
                        ..Default::default()
                    },
                    PeerRecord {
                        ticker: "WIPRO.NS".to_string(),
                        ..Default::default()
                    },
                ])),
                _ => Err(AnalysisError::ApiError("peer service down".to_string())),
            }
        }
    }

    fn classifier_with(companies: Vec<CompanyData>) -> SectorClassifier {
        let map = companies.into_iter().map(|c| (c.ticker.clone(), c)).collect();
        SectorClassifier::new(Arc::new(StaticMarketData(map)))
    }

    fn company(ticker: &str) -> CompanyData {
        CompanyData::new(ticker)
    }

    fn assert_segment_invariants(segments: &[BusinessSegment], threshold: f64) {
        let total: f64 = segments.iter().map(|s| s.revenue_contribution).sum();
        assert!(total <= 1.0 + 1e-6, "contributions sum to {total}");
        for s in segments {
            assert!(s.revenue_contribution >= threshold - 1e-9);
        }
        for pair in segments.windows(2) {
            assert!(pair[0].revenue_contribution >= pair[1].revenue_contribution);
        }
    }

    #[tokio::test]
    async fn test_disclosed_segments_make_a_conglomerate() {
        let mut data = company("GROUP.NS");
        data.name = Some("Group Industries".to_string());
        data.segment_revenues = vec![
            SegmentDisclosure {
                name: "Oil & Gas Refining".to_string(),
                revenue: 600.0,
            },
            SegmentDisclosure {
                name: "Retail stores".to_string(),
                revenue: 300.0,
            },
            SegmentDisclosure {
                name: "Wireless telecom".to_string(),
                revenue: 50.0,
            },
            SegmentDisclosure {
                name: "Petrochemicals".to_string(),
                revenue: 50.0,
            },
        ];
        let classifier = classifier_with(vec![data]);

        let result = classifier.classify("GROUP.NS", false).await;

        assert_eq!(result.evidence, EvidenceKind::DisclosedSegments);
        assert!(result.is_conglomerate);
        assert_eq!(result.primary_sector, SectorId::Energy);
        assert_eq!(result.company_name.as_deref(), Some("Group Industries"));
        // Telecom at 5% is immaterial, the two energy lines merge
        assert_eq!(result.segments.len(), 2);
        assert!((result.segments[0].revenue_contribution - 0.65 / 0.95).abs() < 1e-9);
        assert!(result.segments[0].label.contains("Petrochemicals"));
        assert_segment_invariants(&result.segments, classifier.materiality_threshold());
    }

    #[tokio::test]
    async fn test_known_conglomerate_table() {
        let classifier = classifier_with(vec![]);
        let result = classifier.classify("RELIANCE.NS", false).await;

        assert_eq!(result.evidence, EvidenceKind::KnownConglomerate);
        assert!(result.is_conglomerate);
        assert_eq!(result.primary_sector, SectorId::Energy);
        let sectors: Vec<SectorId> = result.segments.iter().map(|s| s.sector).collect();
        assert_eq!(sectors, vec![SectorId::Energy, SectorId::Retail, SectorId::Telecom]);
        assert_segment_invariants(&result.segments, classifier.materiality_threshold());
    }

    #[tokio::test]
    async fn test_higher_threshold_collapses_small_segments() {
        let classifier = classifier_with(vec![]).with_materiality_threshold(0.30);
        let result = classifier.classify("RELIANCE.NS", false).await;

        assert!(!result.is_conglomerate);
        assert_eq!(result.segments.len(), 1);
        assert!((result.segments[0].revenue_contribution - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_description_with_several_businesses() {
        let mut data = company("DIVERSE");
        data.business_summary = Some(
            "The company operates a private bank offering loans and deposits, \
             and separately develops software and cloud platforms for enterprises."
                .to_string(),
        );
        let classifier = classifier_with(vec![data]);

        let result = classifier.classify("DIVERSE", false).await;

        assert_eq!(result.evidence, EvidenceKind::BusinessDescription);
        assert!(result.is_conglomerate);
        let sectors: Vec<SectorId> = result.segments.iter().map(|s| s.sector).collect();
        assert!(sectors.contains(&SectorId::Bfsi));
        assert!(sectors.contains(&SectorId::It));
    }

    #[tokio::test]
    async fn test_sector_label_single_segment() {
        let mut data = company("HDFCBANK.NS");
        data.sector = Some("Financial Services".to_string());
        data.industry = Some("Banks - Regional".to_string());
        let classifier = classifier_with(vec![data]);

        let result = classifier.classify("HDFCBANK.NS", false).await;

        assert_eq!(result.evidence, EvidenceKind::SectorLabel);
        assert_eq!(result.primary_sector, SectorId::Bfsi);
        assert!(!result.is_conglomerate);
        assert_eq!(result.segments[0].label, "Banks - Regional");
        assert_eq!(result.segments[0].revenue_contribution, 1.0);
    }

    #[tokio::test]
    async fn test_provider_failure_uses_known_ticker() {
        let classifier = classifier_with(vec![]);
        let result = classifier.classify("TCS.NS", false).await;

        assert_eq!(result.evidence, EvidenceKind::KnownTicker);
        assert_eq!(result.primary_sector, SectorId::It);
        assert!(result.company_name.is_none());
    }

    #[tokio::test]
    async fn test_unknown_company_is_generic() {
        let classifier = classifier_with(vec![company("MYSTERY")]);
        let result = classifier.classify("MYSTERY", true).await;

        assert_eq!(result.evidence, EvidenceKind::Fallback);
        assert_eq!(result.primary_sector, SectorId::Generic);
        assert!(!result.is_conglomerate);
        assert!(result.peer_tickers.is_empty());
    }

    #[tokio::test]
    async fn test_peers_exclude_the_company_itself() {
        let classifier = classifier_with(vec![]).with_peer_provider(Arc::new(StaticPeers));

        let result = classifier.classify("TCS.NS", true).await;
        assert_eq!(result.peer_tickers, vec!["INFY.NS".to_string(), "WIPRO.NS".to_string()]);

        let without = classifier.classify("TCS.NS", false).await;
        assert!(without.peer_tickers.is_empty());
    }

    #[tokio::test]
    async fn test_peer_failure_leaves_list_empty() {
        let classifier = classifier_with(vec![]).with_peer_provider(Arc::new(StaticPeers));
        let result = classifier.classify("HDFCBANK.NS", true).await;
        assert_eq!(result.primary_sector, SectorId::Bfsi);
        assert!(result.peer_tickers.is_empty());
    }

    #[test]
    fn test_finalize_keeps_largest_when_everything_is_small() {
        let raw: Vec<BusinessSegment> = SectorId::ALL
            .iter()
            .map(|s| BusinessSegment::new(*s, s.code(), 1.0 + s.code().len() as f64 * 0.01))
            .collect();
        let kept = finalize_segments(raw, 0.10);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].revenue_contribution, 1.0);
    }

    #[test]
    fn test_finalize_drops_non_positive_weights() {
        let raw = vec![
            BusinessSegment::new(SectorId::It, "Services", 80.0),
            BusinessSegment::new(SectorId::Retail, "Stores", -5.0),
            BusinessSegment::new(SectorId::Auto, "Vehicles", 20.0),
        ];
        let kept = finalize_segments(raw, 0.10);
        assert_eq!(kept.len(), 2);
        assert!((kept[0].revenue_contribution - 0.8).abs() < 1e-9);
        assert!((kept[1].revenue_contribution - 0.2).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_classification_json_shape() {
        let result = classifier_with(vec![]).classify("RELIANCE.NS", false).await;
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["primary_sector"], "ENERGY");
        assert_eq!(json["evidence"], "known_conglomerate");
        assert_eq!(json["is_conglomerate"], true);
        assert_eq!(json["segments"].as_array().unwrap().len(), 3);
    }
}
