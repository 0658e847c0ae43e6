//! Prompt construction
//!
//! Both prompts end with the same frame, `"{system}\n\nUser: {query}\nOutput:"`,
//! so the model continues right after `Output:`.

use chartops_core::{QueryCatalog, QueryIdentifier};

const EXISTING_CHARTS_PLACEHOLDER: &str = "{existing_charts}";

const CHART_SYSTEM_PROMPT: &str = r#"You are a JSON generator for chart/graph operations. Convert natural language requests into valid JSON for chart manipulation.
Rules:

ALWAYS return ONLY valid JSON, no explanations or markdown
Strictly follow the JSON template given below
Use ONLY these operations: "create", "update", "delete"
For delete operations, only plotName and operation are required
Based on your understanding, assign the size value to "small", "medium", or "large"
Default to "medium" size and "bar" chart if not specified
Do not put the same column name for xAxis and yAxis
Already existing chart names are {existing_charts} exactly.
If the user asks to delete or update a chart, you should put plotName as one of the existing charts exactly, if none match put the plotName as unknown.
For update and delete do not deviate from the existing chart names.

JSON template:
{
"plotName": "<has to be filled>",
"operation": "create/update/delete",
"plotType": "line/bar/scatter/pie/area/histogram/heatmap",
"size": "small/medium/large",
"xAxis": "<GrossQuantity/FlowRate/ShipmentCompartmentID/BaseProductID/BaseProductCode/ShipmentID/ShipmentCode/ExitTime/BayCode/ScheduledDate/CreatedTime>",
"yAxis": "<GrossQuantity/FlowRate/ShipmentCompartmentID/BaseProductID/BaseProductCode/ShipmentID/ShipmentCode/ExitTime/BayCode/ScheduledDate/CreatedTime>"
}

Chart type keywords:

"line graph", "trend" → "line"
"bar chart", "column" → "bar"
"scatter plot", "dots" → "scatter"
"pie chart", "pi chart", "donut" → "pie"
"area chart" → "area"
"histogram", "distribution" → "histogram"
"heatmap", "matrix" → "heatmap"

Example 1:
User: "Create a small bar chart showing GrossQuantity against BayCode"
Output:
{
"plotName": "gross_quantity_chart",
"operation": "create",
"plotType": "bar",
"size": "small",
"xAxis": "BayCode",
"yAxis": "GrossQuantity"
}

Example 2:
User: "Delete flow_rate_chart"
Output:
{
"plotName": "flow_rate_chart",
"operation": "delete"
}

Example 3:
User: "Make the base product code chart bigger"
Output:
{
"plotName": "base_product_code_chart",
"operation": "update",
"size": "large"
}
Remember: Return ONLY the JSON object, nothing else."#;

/// System prompt for chart commands, naming the charts that already exist
pub fn chart_system_prompt(existing_charts: &[String]) -> String {
    let names: Vec<&str> = existing_charts
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .collect();
    let rendered = if names.is_empty() {
        "none".to_string()
    } else {
        format!("[{}]", names.join(", "))
    };

    CHART_SYSTEM_PROMPT.replace(EXISTING_CHARTS_PLACEHOLDER, &rendered)
}

/// System prompt for identifier mapping, generated from `catalog`
pub fn insights_system_prompt(catalog: &QueryCatalog) -> String {
    let mut prompt = format!(
        "You are a SQL query mapper for bulk liquid terminal analytics. Your job is to map natural language questions to one of the predefined SQL queries.\n\nYou have access to {} predefined SQL queries for terminal analytics:\n\n",
        catalog.identifiers().count()
    );

    for (n, entry) in catalog.iter().enumerate() {
        prompt.push_str(&format!(
            "{}. {} - {}\n",
            n + 1,
            entry.identifier,
            entry.description
        ));
    }

    let first = catalog
        .identifiers()
        .next()
        .map_or("DAILY_THROUGHPUT_ANALYSIS", |id| id.as_str());
    prompt.push_str(&format!(
        "\nALWAYS return ONLY the query identifier (e.g., \"{}\"), no explanations or additional text.\n\nExamples:\n",
        first
    ));

    for identifier in catalog.identifiers() {
        prompt.push_str(&format!(
            "User: \"{}\"\nOutput: {}\n\n",
            example_question(identifier),
            identifier
        ));
    }

    prompt.push_str("Remember: Return ONLY the query identifier, nothing else.");
    prompt
}

fn example_question(identifier: QueryIdentifier) -> &'static str {
    match identifier {
        QueryIdentifier::DailyThroughputAnalysis => "Show me daily throughput trends",
        QueryIdentifier::BayPerformanceComparison => "Which bays are performing best?",
        QueryIdentifier::FlowRatePerformanceAnalysis => "What are the flow rate issues?",
        QueryIdentifier::ScheduleAdherenceAnalysis => "How are we doing with schedule adherence?",
        QueryIdentifier::ProductPortfolioPerformance => "Which products are most profitable?",
        QueryIdentifier::OperationalTimePatterns => "What are the peak operating hours?",
    }
}

/// Frame a user query under a system prompt
pub fn build_prompt(system: &str, query: &str) -> String {
    format!("{}\n\nUser: {}\nOutput:", system, query)
}

pub fn chart_prompt(query: &str, existing_charts: &[String]) -> String {
    build_prompt(&chart_system_prompt(existing_charts), query)
}

pub fn insights_prompt(catalog: &QueryCatalog, query: &str) -> String {
    build_prompt(&insights_system_prompt(catalog), query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_existing_charts_are_listed() {
        let prompt = chart_system_prompt(&["flow_rate_chart".to_string(), " bay_usage ".to_string()]);
        assert!(prompt.contains("Already existing chart names are [flow_rate_chart, bay_usage] exactly."));
        assert!(!prompt.contains(EXISTING_CHARTS_PLACEHOLDER));
    }

    #[test]
    fn test_no_existing_charts() {
        let prompt = chart_system_prompt(&[]);
        assert!(prompt.contains("Already existing chart names are none exactly."));
    }

    #[test]
    fn test_prompt_frame() {
        assert_eq!(
            build_prompt("SYSTEM", "delete trend"),
            "SYSTEM\n\nUser: delete trend\nOutput:"
        );
        assert!(chart_prompt("delete trend", &[]).ends_with("\n\nUser: delete trend\nOutput:"));
    }

    #[test]
    fn test_insights_prompt_covers_catalog() {
        let catalog = QueryCatalog::terminal_analytics();
        let prompt = insights_system_prompt(&catalog);

        assert!(prompt.contains("access to 6 predefined"));
        for entry in catalog.iter() {
            assert!(prompt.contains(&format!("{} - {}", entry.identifier, entry.description)));
            assert!(prompt.contains(&format!("Output: {}\n", entry.identifier)));
        }
    }
}
