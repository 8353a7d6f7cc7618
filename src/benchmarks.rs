//! Benchmark figures published in the Hoxhunt phishing trends report.
//!
//! These charts are rendered as images on the page, so the numbers are
//! transcribed here rather than scraped. Every table is loaded with
//! [`WriteMode::Replace`](crate::warehouse::WriteMode::Replace).

use crate::warehouse::{Cell, Column, ColumnType, TableRow};

/// Share of simulations reported successfully, by industry and months of training.
#[derive(Debug, Clone, PartialEq)]
pub struct IndustryTrainingSuccess {
    pub industry: &'static str,
    pub month_0: i64,
    pub month_6: i64,
    pub month_12: i64,
}

impl TableRow for IndustryTrainingSuccess {
    const TABLE: &'static str = "industry_training_success";

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::new("industry", ColumnType::Text),
            Column::new("month_0", ColumnType::BigInt),
            Column::new("month_6", ColumnType::BigInt),
            Column::new("month_12", ColumnType::BigInt),
        ];
        COLUMNS
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.industry.to_string()),
            Cell::Int(self.month_0),
            Cell::Int(self.month_6),
            Cell::Int(self.month_12),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobRoleTrainingPerformance {
    pub department: &'static str,
    pub success_rate_percent: i64,
    pub miss_rate_percent: i64,
    pub fail_rate_percent: f64,
}

impl TableRow for JobRoleTrainingPerformance {
    const TABLE: &'static str = "job_role_training_performance";

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::new("department", ColumnType::Text),
            Column::new("success_rate_percent", ColumnType::BigInt),
            Column::new("miss_rate_percent", ColumnType::BigInt),
            Column::new("fail_rate_percent", ColumnType::Double),
        ];
        COLUMNS
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.department.to_string()),
            Cell::Int(self.success_rate_percent),
            Cell::Int(self.miss_rate_percent),
            Cell::Float(self.fail_rate_percent),
        ]
    }
}

/// Outcomes by the number of simulated attacks a user has received.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedAttackPerformance {
    pub simulated_attack_number: i64,
    pub success_percent: i64,
    pub fail_percent: f64,
    pub miss_percent: i64,
}

impl TableRow for SimulatedAttackPerformance {
    const TABLE: &'static str = "simulated_attack_performance";

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::new("simulated_attack_number", ColumnType::BigInt),
            Column::new("success_percent", ColumnType::BigInt),
            Column::new("fail_percent", ColumnType::Double),
            Column::new("miss_percent", ColumnType::BigInt),
        ];
        COLUMNS
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Int(self.simulated_attack_number),
            Cell::Int(self.success_percent),
            Cell::Float(self.fail_percent),
            Cell::Int(self.miss_percent),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhishingRateOverTime {
    pub year: i64,
    pub phishing_rate_per_reporter: f64,
    /// Year-over-year change; none for the first year.
    pub percent_increase: Option<i64>,
}

impl TableRow for PhishingRateOverTime {
    const TABLE: &'static str = "phishing_rate_over_time";

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::new("year", ColumnType::BigInt),
            Column::new("phishing_rate_per_reporter", ColumnType::Double),
            Column::new("percent_increase", ColumnType::BigInt),
        ];
        COLUMNS
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            Cell::Int(self.year),
            Cell::Float(self.phishing_rate_per_reporter),
            self.percent_increase.map_or(Cell::Null, Cell::Int),
        ]
    }
}

pub fn industry_training_success() -> Vec<IndustryTrainingSuccess> {
    const ROWS: &[(&str, i64, i64, i64)] = &[
        ("Financial Services", 48, 69, 74),
        ("Government", 55, 68, 70),
        ("IT, software, internet", 54, 62, 66),
        ("Legal, professional, business services", 49, 61, 64),
        ("Logistics, supply chain", 53, 63, 69),
        ("Manufacturing, construction", 48, 64, 67),
        ("Oil & energy", 57, 68, 70),
        ("Pharma & healthcare", 52, 60, 62),
        ("Retail", 40, 58, 61),
        ("Global Success rate", 47, 63, 67),
    ];
    ROWS.iter()
        .map(|&(industry, month_0, month_6, month_12)| IndustryTrainingSuccess {
            industry,
            month_0,
            month_6,
            month_12,
        })
        .collect()
}

pub fn job_role_training_performance() -> Vec<JobRoleTrainingPerformance> {
    const ROWS: &[(&str, i64, i64, f64)] = &[
        ("Legal", 73, 25, 2.4),
        ("Finance", 72, 25, 2.4),
        ("Information technology", 70, 28, 2.3),
        ("Customer relationship", 68, 30, 2.9),
        ("Software engineering", 67, 31, 2.3),
        ("Human resources", 66, 31, 2.8),
        ("Business development", 65, 32, 3.0),
        ("Marketing", 65, 33, 2.7),
        ("Information security", 64, 32, 3.8),
        ("Communications", 63, 34, 3.2),
        ("Sales", 63, 34, 3.2),
        ("Other", 67, 31, 2.8),
    ];
    ROWS.iter()
        .map(
            |&(department, success_rate_percent, miss_rate_percent, fail_rate_percent)| {
                JobRoleTrainingPerformance {
                    department,
                    success_rate_percent,
                    miss_rate_percent,
                    fail_rate_percent,
                }
            },
        )
        .collect()
}

pub fn simulated_attack_performance() -> Vec<SimulatedAttackPerformance> {
    const ROWS: &[(i64, i64, f64, i64)] = &[
        (1, 34, 11.0, 55),
        (6, 55, 4.3, 41),
        (12, 74, 2.3, 24),
        (14, 80, 1.8, 18),
    ];
    ROWS.iter()
        .map(
            |&(simulated_attack_number, success_percent, fail_percent, miss_percent)| {
                SimulatedAttackPerformance {
                    simulated_attack_number,
                    success_percent,
                    fail_percent,
                    miss_percent,
                }
            },
        )
        .collect()
}

pub fn phishing_rate_over_time() -> Vec<PhishingRateOverTime> {
    const ROWS: &[(i64, f64, Option<i64>)] = &[
        (2021, 4.7, None),
        (2022, 6.0, Some(28)),
        (2023, 6.8, Some(13)),
        (2024, 7.0, Some(3)),
    ];
    ROWS.iter()
        .map(
            |&(year, phishing_rate_per_reporter, percent_increase)| PhishingRateOverTime {
                year,
                phishing_rate_per_reporter,
                percent_increase,
            },
        )
        .collect()
}
