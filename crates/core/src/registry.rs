// Tool catalog: the closed set of spreadsheet operations the gateway
// will dispatch. Built once at startup, immutable afterwards.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// JSON type expected for a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Integer => "integer",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
        }
    }
}

/// Per-field constraint applied after type checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    /// Non-empty, non-whitespace string.
    NonEmpty,
    /// Drive file identifier: 20-100 chars of [A-Za-z0-9_-].
    SpreadsheetId,
    /// Sheet tab name: 1-100 chars, no []*?:\/ or control characters.
    SheetName,
    /// A1 notation, optionally prefixed with "Sheet!".
    A1Range,
    /// local@domain with a dotted domain part.
    Email,
    /// Inclusive integer bounds.
    IntRange { min: i64, max: i64 },
}

/// One declared parameter of a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub description: String,
    pub param_type: ParamType,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraint: Option<Constraint>,
}

impl ParamSpec {
    pub fn new(name: &str, param_type: ParamType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            param_type,
            required: false,
            constraint: None,
        }
    }

    pub fn string(name: &str, description: &str) -> Self {
        Self::new(name, ParamType::String, description)
    }

    pub fn integer(name: &str, description: &str) -> Self {
        Self::new(name, ParamType::Integer, description)
    }

    pub fn boolean(name: &str, description: &str) -> Self {
        Self::new(name, ParamType::Boolean, description)
    }

    pub fn array(name: &str, description: &str) -> Self {
        Self::new(name, ParamType::Array, description)
    }

    pub fn object(name: &str, description: &str) -> Self {
        Self::new(name, ParamType::Object, description)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = Some(constraint);
        self
    }
}

/// A named operation with its declared argument schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
}

impl ToolDefinition {
    pub fn new(name: &str, description: &str, params: Vec<ParamSpec>) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            params,
        }
    }

    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Render the schema as a JSON-Schema-shaped object for
    /// introspection and MCP tools/list.
    pub fn input_schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();

        for param in &self.params {
            properties.insert(
                param.name.clone(),
                serde_json::json!({
                    "type": param.param_type.as_str(),
                    "description": param.description,
                }),
            );
            if param.required {
                required.push(Value::String(param.name.clone()));
            }
        }

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Immutable catalog of tools, looked up by name. Safe to share across
/// request handlers without locking once constructed.
pub struct ToolRegistry {
    tools: Vec<ToolDefinition>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Build a registry from a list of definitions. Declaration order
    /// is preserved for introspection.
    pub fn from_definitions(tools: Vec<ToolDefinition>) -> Self {
        let index = tools
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.clone(), i))
            .collect();
        Self { tools, index }
    }

    /// The standard spreadsheet tool catalog.
    pub fn standard() -> Self {
        Self::from_definitions(standard_catalog())
    }

    pub fn lookup(&self, name: &str) -> Option<&ToolDefinition> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All definitions in declaration order.
    pub fn list_all(&self) -> &[ToolDefinition] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

fn spreadsheet_id(name: &str, description: &str) -> ParamSpec {
    ParamSpec::string(name, description)
        .required()
        .constraint(Constraint::SpreadsheetId)
}

fn sheet_name(name: &str, description: &str) -> ParamSpec {
    ParamSpec::string(name, description)
        .required()
        .constraint(Constraint::SheetName)
}

/// The fixed catalog of spreadsheet operations the backend implements.
fn standard_catalog() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            "list_spreadsheets",
            "List all spreadsheets in the configured Drive folder",
            vec![],
        ),
        ToolDefinition::new(
            "create_spreadsheet",
            "Create a new spreadsheet",
            vec![ParamSpec::string("title", "The title of the new spreadsheet")
                .required()
                .constraint(Constraint::NonEmpty)],
        ),
        ToolDefinition::new(
            "get_sheet_data",
            "Get data from a specific sheet in a spreadsheet",
            vec![
                spreadsheet_id("spreadsheet_id", "The ID of the spreadsheet (found in the URL)"),
                sheet_name("sheet", "The name of the sheet"),
                ParamSpec::string("range", "Optional cell range in A1 notation (e.g. 'A1:C10')")
                    .constraint(Constraint::A1Range),
            ],
        ),
        ToolDefinition::new(
            "get_sheet_formulas",
            "Get formulas from a specific sheet in a spreadsheet",
            vec![
                spreadsheet_id("spreadsheet_id", "The ID of the spreadsheet (found in the URL)"),
                sheet_name("sheet", "The name of the sheet"),
                ParamSpec::string("range", "Optional cell range in A1 notation (e.g. 'A1:C10')")
                    .constraint(Constraint::A1Range),
            ],
        ),
        ToolDefinition::new(
            "update_cells",
            "Update cells in a spreadsheet",
            vec![
                spreadsheet_id("spreadsheet_id", "The ID of the spreadsheet (found in the URL)"),
                sheet_name("sheet", "The name of the sheet"),
                ParamSpec::string("range", "Cell range in A1 notation (e.g. 'A1:C10')")
                    .required()
                    .constraint(Constraint::A1Range),
                ParamSpec::array("data", "2D array of values to write").required(),
            ],
        ),
        ToolDefinition::new(
            "batch_update_cells",
            "Batch update multiple ranges in a spreadsheet",
            vec![
                spreadsheet_id("spreadsheet_id", "The ID of the spreadsheet"),
                sheet_name("sheet", "The name of the sheet"),
                ParamSpec::object("ranges", "Mapping from range strings to 2D arrays of values")
                    .required(),
            ],
        ),
        ToolDefinition::new(
            "add_rows",
            "Add rows to a sheet in a spreadsheet",
            vec![
                spreadsheet_id("spreadsheet_id", "The ID of the spreadsheet"),
                sheet_name("sheet", "The name of the sheet"),
                ParamSpec::integer("count", "Number of rows to add")
                    .required()
                    .constraint(Constraint::IntRange { min: 1, max: 1000 }),
                ParamSpec::integer("start_row", "0-based row index to start adding at")
                    .constraint(Constraint::IntRange { min: 0, max: 1_000_000 }),
            ],
        ),
        ToolDefinition::new(
            "add_columns",
            "Add columns to a sheet in a spreadsheet",
            vec![
                spreadsheet_id("spreadsheet_id", "The ID of the spreadsheet"),
                sheet_name("sheet", "The name of the sheet"),
                ParamSpec::integer("count", "Number of columns to add")
                    .required()
                    .constraint(Constraint::IntRange { min: 1, max: 1000 }),
                ParamSpec::integer("start_column", "0-based column index to start adding at")
                    .constraint(Constraint::IntRange { min: 0, max: 1_000_000 }),
            ],
        ),
        ToolDefinition::new(
            "list_sheets",
            "List all sheets in a spreadsheet",
            vec![spreadsheet_id("spreadsheet_id", "The ID of the spreadsheet")],
        ),
        ToolDefinition::new(
            "create_sheet",
            "Create a new sheet tab in an existing spreadsheet",
            vec![
                spreadsheet_id("spreadsheet_id", "The ID of the spreadsheet"),
                ParamSpec::string("title", "The title for the new sheet")
                    .required()
                    .constraint(Constraint::SheetName),
            ],
        ),
        ToolDefinition::new(
            "copy_sheet",
            "Copy a sheet from one spreadsheet to another",
            vec![
                spreadsheet_id("src_spreadsheet", "Source spreadsheet ID"),
                sheet_name("src_sheet", "Source sheet name"),
                spreadsheet_id("dst_spreadsheet", "Destination spreadsheet ID"),
                sheet_name("dst_sheet", "Destination sheet name"),
            ],
        ),
        ToolDefinition::new(
            "rename_sheet",
            "Rename a sheet in a spreadsheet",
            vec![
                spreadsheet_id("spreadsheet", "Spreadsheet ID"),
                sheet_name("sheet", "Current sheet name"),
                ParamSpec::string("new_name", "New sheet name")
                    .required()
                    .constraint(Constraint::SheetName),
            ],
        ),
        ToolDefinition::new(
            "get_multiple_sheet_data",
            "Get data from multiple specific ranges across spreadsheets",
            vec![ParamSpec::array(
                "queries",
                "Query objects with spreadsheet_id, sheet, and range",
            )
            .required()],
        ),
        ToolDefinition::new(
            "get_multiple_spreadsheet_summary",
            "Summarize multiple spreadsheets: sheet names, headers, and first rows",
            vec![
                ParamSpec::array("spreadsheet_ids", "Spreadsheet IDs to summarize").required(),
                ParamSpec::integer("rows_to_fetch", "Rows (including header) per summary")
                    .constraint(Constraint::IntRange { min: 1, max: 100 }),
            ],
        ),
        ToolDefinition::new(
            "share_spreadsheet",
            "Share a spreadsheet with one or more users via email",
            vec![
                spreadsheet_id("spreadsheet_id", "The ID of the spreadsheet to share"),
                ParamSpec::array("recipients", "Recipients with email_address and role").required(),
                ParamSpec::boolean("send_notification", "Whether to send notification emails"),
            ],
        ),
    ]
}
