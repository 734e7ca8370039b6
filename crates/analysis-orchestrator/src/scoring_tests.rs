#[cfg(test)]
mod tests {
    use super::super::scoring::*;
    use analysis_core::{
        BlendedMultiples, BlendedValuationResult, CompanyData, ComponentKind, ComponentScore,
        DcfAssumptions, DcfMethod, DcfMode, DcfResult, FinancialRatios, InvestmentLabel, PeerData,
        PeerRecord, SectorId, TechnicalData, Trend, ValuationSignal,
    };
    use sector_intelligence::SectorModelRegistry;
    use std::sync::Arc;
    use std::time::Duration;

    fn engine() -> WeightedScoringEngine {
        WeightedScoringEngine::new(Arc::new(SectorModelRegistry::builtin()))
    }

    fn tcs() -> CompanyData {
        CompanyData {
            ticker: "TCS.NS".to_string(),
            name: Some("Tata Consultancy Services".to_string()),
            sector: Some("Technology".to_string()),
            current_price: Some(4000.0),
            shares_outstanding: Some(3.6e9),
            revenue: Some(2.4e12),
            ebitda: Some(6.5e11),
            net_income: Some(4.6e11),
            total_debt: Some(0.0),
            cash: Some(3.0e11),
            ratios: FinancialRatios {
                trailing_pe: Some(31.0),
                roe: Some(0.45),
                profit_margin: Some(0.19),
                revenue_growth: Some(0.07),
                debt_to_equity: Some(0.05),
                current_ratio: Some(2.5),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn peers() -> PeerData {
        let peer = |ticker: &str, pe: f64, growth: f64, margin: f64| PeerRecord {
            ticker: ticker.to_string(),
            pe_ratio: Some(pe),
            revenue_growth: Some(growth),
            profit_margin: Some(margin),
            roe: None,
        };
        PeerData::new(vec![
            peer("INFY.NS", 24.0, 0.05, 0.17),
            peer("HCLTECH.NS", 26.0, 0.08, 0.15),
            peer("WIPRO.NS", 22.0, 0.02, 0.13),
            peer("TECHM.NS", 40.0, 0.01, 0.07),
        ])
    }

    fn technicals() -> TechnicalData {
        TechnicalData {
            rsi: Some(45.0),
            trend: Some(Trend::Uptrend),
            ..Default::default()
        }
    }

    fn dcf_signal(upside: Option<f64>) -> ValuationSignal {
        ValuationSignal::Dcf(DcfResult {
            ticker: "TCS.NS".to_string(),
            sector: SectorId::It,
            method: DcfMethod::FirmFreeCashFlow,
            mode: DcfMode::Simple,
            fair_value_per_share: upside.map(|u| 4000.0 * (1.0 + u / 100.0)),
            current_price: Some(4000.0),
            upside_pct: upside,
            enterprise_value: None,
            equity_value: None,
            confidence: 0.8,
            assumptions: DcfAssumptions {
                risk_free_rate: 0.07,
                discount_rate: 0.12,
                terminal_growth: 0.05,
                projection_years: 5,
                tax_rate: 0.25,
                revenue_growth: Some(0.10),
                ebitda_margin: Some(0.27),
                roe: None,
                book_value_per_share: None,
                payout_ratio: None,
            },
            reasoning: vec!["Free cash flow model".to_string()],
        })
    }

    async fn score_with(
        company: CompanyData,
        peers: PeerData,
        technical: TechnicalData,
        valuation: Option<ValuationSignal>,
    ) -> analysis_core::WeightedScoreResult {
        engine()
            .score_with_valuation(
                &company.ticker.clone(),
                Arc::new(company),
                SectorId::It,
                Arc::new(peers),
                Arc::new(technical),
                valuation.map(Arc::new),
            )
            .await
    }

    #[tokio::test]
    async fn test_total_is_exact_weighted_sum() {
        let result = score_with(tcs(), peers(), technicals(), Some(dcf_signal(Some(20.0)))).await;

        assert_eq!(result.dcf.normalized_score, 50.0);
        let expected = 0.35 * result.dcf.normalized_score
            + 0.25 * result.financial.normalized_score
            + 0.20 * result.technical.normalized_score
            + 0.20 * result.peer.normalized_score;
        assert!((result.total_score - expected).abs() < 1e-9);
        assert_eq!(result.label, InvestmentLabel::from_score(result.total_score));

        let expected_confidence: f64 = result
            .components()
            .iter()
            .map(|c| c.component.weight() * c.confidence)
            .sum();
        assert!((result.confidence - expected_confidence.max(0.2)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_missing_inputs_degrade_to_confidence_floor() {
        let result = score_with(
            CompanyData::new("UNKNOWN"),
            PeerData::default(),
            TechnicalData::default(),
            None,
        )
        .await;

        assert!(result.components().iter().all(|c| c.is_degraded()));
        assert_eq!(result.total_score, 0.0);
        assert_eq!(result.label, InvestmentLabel::Neutral);
        assert_eq!(result.confidence, 0.2);
        assert_eq!(result.peer.reasoning, vec!["No peer data available".to_string()]);
        assert_eq!(result.dcf.reasoning, vec!["No valuation available".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_peers_still_scores() {
        let result = score_with(tcs(), PeerData::default(), technicals(), Some(dcf_signal(Some(10.0)))).await;

        assert_eq!(result.peer.confidence, 0.0);
        assert_eq!(result.peer.normalized_score, 0.0);
        assert!(!result.financial.is_degraded());
        assert!(result.confidence >= 0.2);
    }

    #[tokio::test]
    async fn test_identical_inputs_serialize_identically() {
        let first = score_with(tcs(), peers(), technicals(), Some(dcf_signal(Some(12.5)))).await;
        let second = score_with(tcs(), peers(), technicals(), Some(dcf_signal(Some(12.5)))).await;

        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn test_score_runs_sector_dcf() {
        let company = tcs();
        let result = engine()
            .score(
                "TCS.NS",
                Arc::new(company),
                SectorId::It,
                Arc::new(peers()),
                Arc::new(technicals()),
            )
            .await;

        assert!(!result.dcf.is_degraded());
        assert!(result.dcf.reasoning[0].contains("free cash flow"));
        assert!(result.dcf.normalized_score.abs() <= 100.0);
    }

    #[tokio::test]
    async fn test_score_is_repeatable_with_fallback_rate() {
        let run = || async {
            engine()
                .score(
                    "TCS.NS",
                    Arc::new(tcs()),
                    SectorId::It,
                    Arc::new(peers()),
                    Arc::new(technicals()),
                )
                .await
        };
        let first = serde_json::to_string(&run().await).unwrap();
        let second = serde_json::to_string(&run().await).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_valuation_component_scaling() {
        assert_eq!(valuation_component(&dcf_signal(Some(-20.0))).normalized_score, -50.0);
        assert_eq!(valuation_component(&dcf_signal(Some(60.0))).normalized_score, 100.0);

        let score = valuation_component(&dcf_signal(Some(60.0)));
        assert_eq!(score.raw_score, 60.0);
        assert_eq!(score.confidence, 0.8);
        assert_eq!(score.reasoning[0], "free cash flow fair value 6400.00, upside +60.0%");
        let downside = valuation_component(&dcf_signal(Some(-20.0)));
        assert_eq!(downside.reasoning[0], "free cash flow fair value 3200.00, upside -20.0%");
    }

    #[test]
    fn test_valuation_without_upside_degrades() {
        let score = valuation_component(&dcf_signal(None));
        assert!(score.is_degraded());
        assert_eq!(score.reasoning[0], "No upside from free cash flow valuation");
        assert_eq!(score.reasoning[1], "Free cash flow model");
    }

    #[test]
    fn test_blended_valuation_falls_back_to_gap() {
        let blended = ValuationSignal::Blended(BlendedValuationResult {
            ticker: "RELIANCE.NS".to_string(),
            company_name: None,
            segments: vec![],
            sum_of_parts_value: 1.2e13,
            conglomerate_discount_pct: 20.0,
            discounted_sotp_value: 9.6e12,
            market_cap: Some(8.0e12),
            valuation_gap_pct: Some(20.0),
            blended_multiples: BlendedMultiples {
                pe: Some(28.1),
                pb: None,
                ev_ebitda: None,
                pe_band: None,
            },
            fair_value_per_share: None,
            current_price: None,
            upside_pct: None,
            confidence: 0.4,
            reasoning: vec![],
        });
        let score = valuation_component(&blended);

        assert_eq!(score.normalized_score, 50.0);
        assert_eq!(score.reasoning[0], "sum of the parts valuation gap +20.0%");
    }

    #[test]
    fn test_confidence_is_capped_and_floored() {
        let full = |kind| ComponentScore::from_raw(kind, 0.5, 1.0, 1.0, vec![]);
        let result = engine().combine(
            "X",
            full(ComponentKind::Dcf),
            full(ComponentKind::Financial),
            full(ComponentKind::Technical),
            full(ComponentKind::Peer),
        );
        assert!((result.confidence - 1.0).abs() < 1e-12);
        assert!((result.total_score - 50.0).abs() < 1e-9);
        assert_eq!(result.label, InvestmentLabel::CautiouslyBullish);

        let floored = engine().with_confidence_floor(0.35).combine(
            "X",
            ComponentScore::degraded(ComponentKind::Dcf, "none"),
            ComponentScore::degraded(ComponentKind::Financial, "none"),
            ComponentScore::degraded(ComponentKind::Technical, "none"),
            ComponentScore::from_raw(ComponentKind::Peer, -1.0, 1.0, 0.5, vec![]),
        );
        assert_eq!(floored.confidence, 0.35);
        assert!((floored.total_score + 20.0).abs() < 1e-9);
        assert_eq!(floored.label, InvestmentLabel::Neutral);
    }

    fn explode() -> ComponentScore {
        panic!("scorer blew up")
    }

    #[tokio::test]
    async fn test_panicking_component_degrades() {
        let handle = tokio::spawn(async { explode() });
        let score = settle(ComponentKind::Technical, Duration::from_secs(1), handle).await;

        assert!(score.is_degraded());
        assert_eq!(score.reasoning, vec!["Technical component failed".to_string()]);
    }

    #[tokio::test]
    async fn test_slow_component_times_out() {
        let handle = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            ComponentScore::from_raw(ComponentKind::Peer, 1.0, 1.0, 1.0, vec![])
        });
        let score = settle(ComponentKind::Peer, Duration::from_millis(20), handle).await;

        assert!(score.is_degraded());
        assert_eq!(score.reasoning, vec!["Peer component timed out after 20ms".to_string()]);
    }
}
