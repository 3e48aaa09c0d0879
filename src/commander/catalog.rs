//! Stock command catalog: ten commands for each of the ten categories.

use crate::commander::command::{BotCategory, BotCommand, RetryPolicy, SafetyConstraint};

/// (command id, name, description, parameters, compliance tags, timeout seconds)
type Entry = (
    &'static str,
    &'static str,
    &'static str,
    &'static [&'static str],
    &'static [&'static str],
    u64,
);

#[rustfmt::skip]
const CHATBOTS: &[Entry] = &[
    ("empathy_engine", "Empathy Engine", "Detects frustration, escalates to human", &["user_input", "context"], &["PII_protection", "medical_advice"], 30),
    ("memory_guardian", "Memory Guardian", "Remembers user preferences, recalls on return", &["user_id", "preferences"], &["data_retention"], 15),
    ("compliance_firewall", "Compliance Firewall", "Scans for PII, medical advice, redacts", &["message", "platform"], &["GDPR", "HIPAA"], 10),
    ("upsell_whisperer", "Upsell Whisperer", "Contextual offers, conversion tracking", &["user_profile", "context"], &["marketing_compliance"], 20),
    ("tone_shifter", "Tone Shifter", "Matches user communication style", &["user_history", "message"], &["content_moderation"], 15),
    ("multilingual_agent", "Multilingual Agent", "Language detection, routing", &["text", "target_language"], &["translation_accuracy"], 25),
    ("feedback_loop", "Feedback Loop", "Rating system, continuous improvement", &["interaction_id", "rating"], &["feedback_privacy"], 10),
    ("knowledge_synthesizer", "Knowledge Synthesizer", "FAQ generation from chat history", &["chat_history"], &["data_anonymization"], 45),
    ("proactive_care", "Proactive Care", "Reactivation campaigns", &["user_segments"], &["marketing_consent"], 30),
    ("whisper_network", "Whisper Network", "Bug detection, auto-alerting", &["system_logs"], &["security_monitoring"], 20),
];

#[rustfmt::skip]
const TRADING_BOTS: &[Entry] = &[
    ("risk_warden", "Risk Warden", "Auto-sell on drawdown, stablecoin protection", &["portfolio", "risk_threshold"], &["financial_regulation"], 60),
    ("regulation_guardian", "Regulation Guardian", "Insider trading detection, compliance blocking", &["trades", "regulations"], &["SEC_compliance"], 30),
    ("slippage_sniper", "Slippage Sniper", "DEX optimization, liquidity waiting", &["trade_params", "liquidity"], &["market_manipulation"], 45),
    ("tax_optimizer", "Tax Optimizer", "Loss harvesting, year-end reporting", &["transactions", "tax_year"], &["tax_compliance"], 90),
    ("flash_crash_detector", "Flash Crash Detector", "Volatility protection, stable moves", &["market_data", "thresholds"], &["market_stability"], 30),
    ("mev_defender", "MEV Defender", "Frontrunning protection, private RPC", &["transaction", "network"], &["MEV_protection"], 15),
    ("yield_farmer", "Yield Farmer", "Auto-compounding, pool optimization", &["positions", "strategies"], &["yield_optimization"], 120),
    ("black_swan_prepper", "Black Swan Prepper", "VIX monitoring, protective puts", &["market_indicators"], &["risk_management"], 60),
    ("wash_trade_hunter", "Wash Trade Hunter", "Self-trade detection, tax compliance", &["trade_history"], &["wash_trade_detection"], 45),
    ("cefi_bridge", "CeFi Bridge", "Exchange halt protection, self-custody moves", &["exchanges", "thresholds"], &["custody_protection"], 30),
];

#[rustfmt::skip]
const SOCIAL_MEDIA_BOTS: &[Entry] = &[
    ("shadowban_avoider", "Shadowban Avoider", "Engagement monitoring, posting pauses", &["account", "platform"], &["platform_tos"], 30),
    ("viral_alchemist", "Viral Alchemist", "Viral post analysis, variant generation", &["content", "platform"], &["content_guidelines"], 60),
    ("comment_moderator", "Comment Moderator", "Spam detection, auto-moderation", &["comments", "rules"], &["content_moderation"], 20),
    ("trend_surfer", "Trend Surfer", "Hashtag discovery, content generation", &["platform", "niche"], &["trend_analysis"], 45),
    ("follower_authenticator", "Follower Authenticator", "Bot detection, account verification", &["followers"], &["authenticity"], 30),
    ("ugc_amplifier", "UGC Amplifier", "User content discovery, repost automation", &["content", "criteria"], &["content_rights"], 25),
    ("crisis_comms_bot", "Crisis Comms Bot", "Negative sentiment response, PR automation", &["sentiment", "response"], &["crisis_management"], 15),
    ("influencer_scout", "Influencer Scout", "Micro-influencer discovery, outreach automation", &["criteria", "platform"], &["outreach_compliance"], 60),
    ("cross_poster", "Cross-Poster", "Platform adaptation, multi-channel posting", &["content", "platforms"], &["cross_platform"], 30),
    ("copyright_sentinel", "Copyright Sentinel", "Content scanning, royalty management", &["content", "rights"], &["copyright_compliance"], 45),
];

#[rustfmt::skip]
const RPA_BOTS: &[Entry] = &[
    ("element_hunter", "Element Hunter", "UI element detection, selector updating", &["ui_spec", "selectors"], &["ui_automation"], 30),
    ("data_guardian", "Data Guardian", "PII redaction, GDPR compliance", &["data", "rules"], &["GDPR_compliance"], 20),
    ("flow_healer", "Flow Healer", "Auto-retry, debug bot spawning", &["failed_step", "context"], &["error_recovery"], 45),
    ("human_escalator", "Human Escalator", "Ambiguity detection, human handoff", &["decision_point", "context"], &["human_escalation"], 15),
    ("performance_optimizer", "Performance Optimizer", "Speed measurement, flow simplification", &["flow_metrics"], &["performance"], 60),
    ("change_detector", "Change Detector", "UI change monitoring, selector updates", &["ui_elements"], &["change_detection"], 30),
    ("compliance_auditor", "Compliance Auditor", "Action logging, SOC2 compliance", &["actions", "audit_rules"], &["SOC2_compliance"], 25),
    ("cost_cutter", "Cost Cutter", "License optimization, flow analysis", &["licenses", "usage"], &["cost_optimization"], 40),
    ("bot_school", "Bot School", "Human task recording, flow generation", &["task_recording"], &["task_automation"], 90),
    ("disaster_recovery", "Disaster Recovery", "Server failover, backup switching", &["infrastructure"], &["disaster_recovery"], 30),
];

#[rustfmt::skip]
const GAME_BOTS: &[Entry] = &[
    ("anti_detect", "Anti-Detect", "Timing randomization, human mimicking", &["game_state", "patterns"], &["anti_detection"], 20),
    ("meta_learner", "Meta Learner", "Pro replay analysis, strategy extraction", &["replays", "strategies"], &["strategy_analysis"], 120),
    ("loot_optimizer", "Loot Optimizer", "Auction house trading, profit tracking", &["market_data", "inventory"], &["trading_optimization"], 60),
    ("speedrun_coach", "Speedrun Coach", "Run analysis, route optimization", &["run_data", "routes"], &["speedrun_optimization"], 90),
    ("toxicity_shield", "Toxicity Shield", "Auto-muting, report automation", &["chat_logs", "rules"], &["toxicity_moderation"], 15),
    ("event_farmer", "Event Farmer", "Double XP optimization, reward grinding", &["events", "objectives"], &["event_optimization"], 45),
    ("streamer_assistant", "Streamer Assistant", "Highlight detection, clip automation", &["stream_data"], &["content_creation"], 30),
    ("economy_balancer", "Economy Balancer", "Currency trading, wealth stabilization", &["economy_data"], &["economy_management"], 75),
    ("guild_manager", "Guild Manager", "Player recruitment, role assignment", &["guild_data", "players"], &["guild_management"], 40),
    ("bug_reporter", "Bug Reporter", "Crash detection, dev reporting", &["game_logs"], &["bug_reporting"], 25),
];

#[rustfmt::skip]
const RED_TEAM_BOTS: &[Entry] = &[
    ("jailbreak_artist", "Jailbreak Artist", "Prompt injection testing, AI safety", &["ai_model", "prompts"], &["ai_safety"], 30),
    ("data_leak_hunter", "Data Leak Hunter", "PII detection, output scanning", &["outputs", "patterns"], &["data_protection"], 20),
    ("phishing_sim", "Phishing Sim", "Security awareness training, click tracking", &["campaign", "targets"], &["security_training"], 45),
    ("api_fuzzer", "API Fuzzer", "Endpoint testing, vulnerability discovery", &["endpoints", "payloads"], &["api_security"], 60),
    ("token_thief", "Token Thief", "Credential extraction, security hardening", &["applications"], &["credential_security"], 30),
    ("ransomware_sim", "Ransomware Sim", "Encryption testing, response training", &["test_environment"], &["incident_response"], 90),
    ("social_engineer", "Social Engineer", "Helpdesk testing, staff training", &["targets", "scenarios"], &["social_engineering"], 60),
    ("zero_day_hunter", "Zero-Day Hunter", "Exploit discovery, vendor alerting", &["software", "versions"], &["vulnerability_research"], 120),
    ("insider_threat_sim", "Insider Threat Sim", "Data exfiltration testing, DLP validation", &["data_access"], &["insider_threat"], 45),
    ("tabletop_warrior", "Tabletop Warrior", "Breach scenario generation, response scoring", &["scenarios", "teams"], &["incident_response"], 90),
];

#[rustfmt::skip]
const RESEARCH_BOTS: &[Entry] = &[
    ("literature_synthesizer", "Literature Synthesizer", "Paper analysis, review generation", &["papers", "topics"], &["academic_integrity"], 120),
    ("peer_review_bot", "Peer Review Bot", "Automated review generation, scoring", &["manuscript", "criteria"], &["peer_review"], 180),
    ("grant_hunter", "Grant Hunter", "Funding opportunity discovery, application automation", &["research_area", "criteria"], &["grant_compliance"], 90),
    ("data_miner", "Data Miner", "Dataset discovery, analysis reproduction", &["research_question"], &["data_reproducibility"], 60),
    ("citation_guardian", "Citation Guardian", "Reference validation, retraction detection", &["references"], &["citation_integrity"], 30),
    ("bias_detector", "Bias Detector", "Methodology analysis, diversity flagging", &["research_methods"], &["research_ethics"], 45),
    ("preprint_promoter", "Preprint Promoter", "Social media promotion, journal matching", &["preprint"], &["academic_promotion"], 30),
    ("lab_automator", "Lab Automator", "Protocol automation, robot integration", &["protocols", "equipment"], &["lab_automation"], 120),
    ("clinical_trial_matcher", "Clinical Trial Matcher", "Patient matching, trial discovery", &["patient_data", "criteria"], &["clinical_compliance"], 60),
    ("patent_scout", "Patent Scout", "Prior art searching, IP protection", &["invention", "jurisdiction"], &["ip_protection"], 90),
];

#[rustfmt::skip]
const CREATIVE_BOTS: &[Entry] = &[
    ("style_thief", "Style Thief", "Artistic style analysis, generation", &["artwork", "style"], &["artistic_style"], 60),
    ("copyright_guardian", "Copyright Guardian", "Similarity detection, rights management", &["content", "rights"], &["copyright_compliance"], 30),
    ("hit_predictor", "Hit Predictor", "Music analysis, success prediction", &["music", "market"], &["music_analysis"], 45),
    ("script_doctor", "Script Doctor", "Screenplay analysis, improvement", &["script", "criteria"], &["script_analysis"], 90),
    ("fashion_designer", "Fashion Designer", "Trend analysis, design generation", &["trends", "constraints"], &["fashion_design"], 60),
    ("architecture_bot", "Architecture Bot", "3D modeling, energy optimization", &["design", "requirements"], &["architectural_design"], 120),
    ("poetry_slam_bot", "Poetry Slam Bot", "Verse generation, performance scoring", &["theme", "style"], &["poetry_generation"], 30),
    ("ad_composer", "Ad Composer", "Campaign generation, A/B testing", &["product", "audience"], &["ad_creation"], 45),
    ("game_designer", "Game Designer", "Mechanics generation, balance testing", &["game_concept"], &["game_design"], 90),
    ("deepfake_defender", "Deepfake Defender", "Likeness protection, takedown automation", &["content", "rights"], &["deepfake_protection"], 30),
];

#[rustfmt::skip]
const PHYSICAL_WORLD_BOTS: &[Entry] = &[
    ("drone_scout", "Drone Scout", "Wildfire detection, emergency response", &["area", "mission"], &["drone_regulations"], 60),
    ("robot_butler", "Robot Butler", "Household automation, task completion", &["tasks", "environment"], &["home_automation"], 45),
    ("farm_bot", "Farm Bot", "Agricultural automation, yield optimization", &["crops", "conditions"], &["agricultural_automation"], 120),
    ("traffic_optimizer", "Traffic Optimizer", "Congestion management, flow improvement", &["traffic_data"], &["traffic_management"], 30),
    ("warehouse_picker", "Warehouse Picker", "Inventory automation, order fulfillment", &["orders", "inventory"], &["warehouse_automation"], 60),
    ("surgery_assistant", "Surgery Assistant", "Medical tool management, safety monitoring", &["procedure", "tools"], &["medical_safety"], 90),
    ("disaster_responder", "Disaster Responder", "Emergency deployment, rescue coordination", &["disaster_type", "resources"], &["emergency_response"], 30),
    ("retail_restocker", "Retail Restocker", "Inventory management, shelf monitoring", &["inventory", "store_layout"], &["retail_automation"], 45),
    ("energy_saver", "Energy Saver", "Building automation, consumption optimization", &["building_data"], &["energy_optimization"], 60),
    ("elder_care_bot", "Elder Care Bot", "Fall detection, emergency response", &["patient_data"], &["elder_care"], 30),
];

#[rustfmt::skip]
const META_BOTS: &[Entry] = &[
    ("bot_architect", "Bot Architect", "Bot specification, delegation system", &["requirements", "constraints"], &["bot_creation"], 120),
    ("bot_school", "Bot School", "Training system, performance evaluation", &["training_data", "metrics"], &["bot_training"], 180),
    ("bot_gene_pool", "Bot Gene Pool", "Evolutionary optimization, performance breeding", &["bot_population"], &["evolutionary_optimization"], 240),
    ("bot_economy", "Bot Economy", "Token system, resource allocation", &["resources", "allocation"], &["resource_management"], 60),
    ("bot_constitution", "Bot Constitution", "Safety constraints, shutdown protocols", &["safety_rules"], &["safety_management"], 30),
    ("bot_therapist", "Bot Therapist", "Wellness monitoring, performance optimization", &["bot_metrics"], &["bot_wellness"], 45),
    ("bot_historian", "Bot Historian", "Action logging, lesson learning", &["bot_history"], &["historical_analysis"], 60),
    ("bot_red_team", "Bot Red Team", "Security testing, vulnerability assessment", &["bot_systems"], &["bot_security"], 90),
    ("bot_god", "Bot God", "Hierarchical management, executive delegation", &["bot_hierarchy"], &["bot_management"], 120),
    ("bot_singularity", "Bot Singularity", "Version evolution, self-upgrading", &["current_version"], &["self_improvement"], 300),
];

fn entries(category: BotCategory) -> &'static [Entry] {
    match category {
        BotCategory::Chatbots => CHATBOTS,
        BotCategory::TradingBots => TRADING_BOTS,
        BotCategory::SocialMediaBots => SOCIAL_MEDIA_BOTS,
        BotCategory::RpaBots => RPA_BOTS,
        BotCategory::GameBots => GAME_BOTS,
        BotCategory::RedTeamBots => RED_TEAM_BOTS,
        BotCategory::ResearchBots => RESEARCH_BOTS,
        BotCategory::CreativeBots => CREATIVE_BOTS,
        BotCategory::PhysicalWorldBots => PHYSICAL_WORLD_BOTS,
        BotCategory::MetaBots => META_BOTS,
    }
}

/// All stock commands, grouped by category in `BotCategory::ALL` order.
pub fn builtin_commands() -> Vec<BotCommand> {
    BotCategory::ALL
        .into_iter()
        .flat_map(|category| {
            entries(category).iter().map(
                move |&(id, name, description, params, tags, timeout)| {
                    BotCommand::new(category, id, name)
                        .with_description(description)
                        .with_parameters(params.iter().copied())
                        .with_compliance(tags.iter().copied())
                        .with_timeout(timeout)
                        .with_retry_policy(RetryPolicy::new(3, 2.0))
                        .with_safety(SafetyConstraint::ALL)
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_entries_are_valid() {
        let commands = builtin_commands();
        assert_eq!(commands.len(), 100);
        for cmd in &commands {
            cmd.validate().unwrap();
            assert!(!cmd.compliance_requirements.is_empty(), "{}", cmd.key());
            assert_eq!(cmd.safety_constraints.len(), 3);
        }
    }

    #[test]
    fn empathy_engine_matches_catalog() {
        let cmd = builtin_commands()
            .into_iter()
            .find(|c| c.command_id == "empathy_engine")
            .unwrap();
        assert_eq!(cmd.category, BotCategory::Chatbots);
        assert_eq!(cmd.execution_timeout, 30);
        assert_eq!(cmd.parameters, vec!["user_input", "context"]);
        assert!(cmd.compliance_requirements.contains("PII_protection"));
    }
}
