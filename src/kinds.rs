//! Record kinds and their field schemas.
//!
//! Every tenant-scoped table is described here once; the schema manager, the
//! repository and the router all work from these descriptions.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate};
use serde_json::{Map, Value};

use crate::errors::AppError;

/// Column holding the owning account on every record table.
pub const OWNER_COLUMN: &str = "usuario_id";
pub const STATUS_COLUMN: &str = "status";
pub const DEFAULT_STATUS: &str = "Active";

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Decimal,
    Integer,
    Date,
}

impl FieldType {
    pub fn sql_type(self) -> &'static str {
        match self {
            FieldType::Text | FieldType::Date => "TEXT",
            FieldType::Decimal => "REAL NOT NULL DEFAULT 0",
            FieldType::Integer => "INTEGER NOT NULL DEFAULT 0",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
}

const fn text(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        ty: FieldType::Text,
    }
}
const fn decimal(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        ty: FieldType::Decimal,
    }
}
const fn integer(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        ty: FieldType::Integer,
    }
}
const fn date(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        ty: FieldType::Date,
    }
}

const CUSTOMER_FIELDS: &[FieldSpec] = &[
    text("nome"),
    text("documento"),
    text("telefone"),
    text("email"),
    text("endereco"),
    text("cidade"),
    text("cep"),
    text("tipo"),
];

const SUPPLIER_FIELDS: &[FieldSpec] = &[
    text("nome"),
    text("cnpj"),
    text("telefone"),
    text("email"),
    text("endereco"),
    text("cidade"),
    text("contato"),
    text("observacoes"),
];

const EMPLOYEE_FIELDS: &[FieldSpec] = &[
    text("nome"),
    text("cpf"),
    text("cargo"),
    text("telefone"),
    text("email"),
    decimal("salario"),
    date("data_admissao"),
];

const PRODUCT_FIELDS: &[FieldSpec] = &[
    text("nome"),
    text("codigo"),
    text("categoria"),
    text("descricao"),
    text("unidade"),
    decimal("preco_custo"),
    decimal("preco_venda"),
    integer("estoque"),
    integer("estoque_minimo"),
];

const SERVICE_ORDER_FIELDS: &[FieldSpec] = &[
    text("cliente"),
    text("equipamento"),
    text("defeito"),
    text("servico"),
    text("tecnico"),
    text("observacoes"),
    decimal("valor_total"),
    date("data_abertura"),
    date("data_conclusao"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Customer,
    Supplier,
    Employee,
    Product,
    ServiceOrder,
}

impl RecordKind {
    pub const ALL: [RecordKind; 5] = [
        RecordKind::Customer,
        RecordKind::Supplier,
        RecordKind::Employee,
        RecordKind::Product,
        RecordKind::ServiceOrder,
    ];

    pub fn table(self) -> &'static str {
        match self {
            RecordKind::Customer => "clientes",
            RecordKind::Supplier => "fornecedores",
            RecordKind::Employee => "funcionarios",
            RecordKind::Product => "produtos",
            RecordKind::ServiceOrder => "ordens_servico",
        }
    }

    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            RecordKind::Customer => CUSTOMER_FIELDS,
            RecordKind::Supplier => SUPPLIER_FIELDS,
            RecordKind::Employee => EMPLOYEE_FIELDS,
            RecordKind::Product => PRODUCT_FIELDS,
            RecordKind::ServiceOrder => SERVICE_ORDER_FIELDS,
        }
    }

    /// Singular label used in response messages and logs.
    pub fn label(self) -> &'static str {
        match self {
            RecordKind::Customer => "customer",
            RecordKind::Supplier => "supplier",
            RecordKind::Employee => "employee",
            RecordKind::Product => "product",
            RecordKind::ServiceOrder => "service order",
        }
    }

    /// Comma separated list of every selectable column, in row order.
    pub fn select_list(self) -> String {
        let mut cols = vec!["id", OWNER_COLUMN];
        cols.extend(self.fields().iter().map(|f| f.name));
        cols.push(STATUS_COLUMN);
        cols.join(", ")
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RecordKind {
    type Err = AppError;

    fn from_str(slug: &str) -> Result<Self, Self::Err> {
        match slug {
            "customers" | "clientes" => Ok(RecordKind::Customer),
            "suppliers" | "fornecedores" => Ok(RecordKind::Supplier),
            "employees" | "funcionarios" => Ok(RecordKind::Employee),
            "products" | "produtos" => Ok(RecordKind::Product),
            "service-orders" | "ordens-servico" | "ordens_servico" => {
                Ok(RecordKind::ServiceOrder)
            }
            _ => Err(AppError::NotFound),
        }
    }
}

/// A coerced value ready to be bound to a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(Option<String>),
    Decimal(f64),
    Integer(i64),
    Date(Option<NaiveDate>),
}

/// Kind-specific attributes of a create/update body, in schema order.
/// `provided[i]` is set when the body carried the key for `values[i]`,
/// even as `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFields {
    pub values: Vec<FieldValue>,
    pub provided: Vec<bool>,
    pub status: Option<String>,
}

impl RecordFields {
    /// Coerces a JSON body against the kind's schema. Keys outside the schema,
    /// including `id` and the owner column, are ignored.
    pub fn from_json(kind: RecordKind, body: &Map<String, Value>) -> Result<Self, AppError> {
        let values = kind
            .fields()
            .iter()
            .map(|spec| coerce(spec, body.get(spec.name)))
            .collect::<Result<Vec<_>, _>>()?;
        let provided = kind
            .fields()
            .iter()
            .map(|spec| body.contains_key(spec.name))
            .collect();

        let status = match body.get(STATUS_COLUMN) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        };

        Ok(RecordFields {
            values,
            provided,
            status,
        })
    }
}

fn invalid(spec: &FieldSpec, expected: &str) -> AppError {
    AppError::Validation(format!("Field '{}' must be {}", spec.name, expected))
}

fn coerce(spec: &FieldSpec, raw: Option<&Value>) -> Result<FieldValue, AppError> {
    let raw = match raw {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if spec.ty != FieldType::Text && s.trim().is_empty() => None,
        Some(v) => Some(v),
    };

    match spec.ty {
        FieldType::Text => Ok(FieldValue::Text(raw.map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }))),
        FieldType::Decimal => {
            let n = match raw {
                None => 0.0,
                Some(Value::Number(n)) => n.as_f64().ok_or_else(|| invalid(spec, "a number"))?,
                Some(Value::String(s)) => s
                    .trim()
                    .replace(',', ".")
                    .parse::<f64>()
                    .map_err(|_| invalid(spec, "a number"))?,
                Some(_) => return Err(invalid(spec, "a number")),
            };
            if !n.is_finite() {
                return Err(invalid(spec, "a finite number"));
            }
            Ok(FieldValue::Decimal(n))
        }
        FieldType::Integer => {
            let n = match raw {
                None => 0,
                Some(Value::Number(n)) => match (n.as_i64(), n.as_f64()) {
                    (Some(i), _) => i,
                    (None, Some(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => f as i64,
                    _ => return Err(invalid(spec, "an integer")),
                },
                Some(Value::String(s)) => s
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| invalid(spec, "an integer"))?,
                Some(_) => return Err(invalid(spec, "an integer")),
            };
            Ok(FieldValue::Integer(n))
        }
        FieldType::Date => match raw {
            None => Ok(FieldValue::Date(None)),
            Some(Value::String(s)) => parse_date(s.trim())
                .map(|d| FieldValue::Date(Some(d)))
                .ok_or_else(|| invalid(spec, "a date (YYYY-MM-DD)")),
            Some(_) => Err(invalid(spec, "a date (YYYY-MM-DD)")),
        },
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
