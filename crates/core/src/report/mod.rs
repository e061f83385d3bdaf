pub mod artifact;

use crate::pipeline::rank::{RankingResult, TOP_N};
use anyhow::Context;
use comfy_table::{presets::ASCII_FULL, Cell, CellAlignment, Table};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyEntry {
    #[serde(rename = "Company")]
    pub company: String,
    #[serde(rename = "Profit_Potential")]
    pub profit_potential: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerEntry {
    #[serde(rename = "Broker")]
    pub broker: String,
    #[serde(rename = "Profit_Potential")]
    pub profit_potential: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Report {
    pub top_companies: Vec<CompanyEntry>,
    pub top_brokers: Vec<BrokerEntry>,
}

pub fn emit(ranking: &RankingResult) -> Report {
    Report {
        top_companies: ranking
            .top_companies
            .iter()
            .map(|r| CompanyEntry {
                company: r.company.clone(),
                profit_potential: r.profit_potential,
            })
            .collect(),
        top_brokers: ranking
            .top_brokers
            .iter()
            .map(|r| BrokerEntry {
                broker: r.broker.clone(),
                profit_potential: r.profit_potential,
            })
            .collect(),
    }
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.top_companies.is_empty() && self.top_brokers.is_empty()
    }

    pub fn to_value(&self) -> anyhow::Result<serde_json::Value> {
        serde_json::to_value(self).context("report serialization failed")
    }

    pub fn to_json_pretty(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("report serialization failed")
    }

    pub fn render_table(&self) -> String {
        let companies: Vec<[String; 2]> = self
            .top_companies
            .iter()
            .map(|e| [e.company.clone(), format_profit(e.profit_potential)])
            .collect();
        let brokers: Vec<[String; 2]> = self
            .top_brokers
            .iter()
            .map(|e| [e.broker.clone(), format_profit(e.profit_potential)])
            .collect();

        format!(
            "Top {TOP_N} Companies by Profit Potential\n{}\n\n\
             Top {TOP_N} Brokers by Profit Potential\n{}\n",
            render_section("Company", &companies),
            render_section("Broker", &brokers),
        )
    }
}

fn render_section(name_header: &str, rows: &[[String; 2]]) -> String {
    if rows.is_empty() {
        return "(no qualifying recommendations)".to_string();
    }

    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_header(vec![name_header, "Profit_Potential"]);
    for [name, profit] in rows {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(profit).set_alignment(CellAlignment::Right),
        ]);
    }
    table.to_string()
}

fn format_profit(v: f64) -> String {
    format!("{v:.2}")
}
