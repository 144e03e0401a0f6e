use crate::domain::model::StreamDescriptor;
use crate::utils::error::{EtlError, Result};
use std::fmt;

/// The Fastbill collections this connector can read.
///
/// Each variant only differs in the service it calls, the key its rows are
/// returned under and the field identifying a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Customers,
    Invoices,
    RecurringInvoices,
    Products,
    Revenues,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Customers,
        Resource::Invoices,
        Resource::RecurringInvoices,
        Resource::Products,
        Resource::Revenues,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Resource::Customers => "customers",
            Resource::Invoices => "invoices",
            Resource::RecurringInvoices => "recurring_invoices",
            Resource::Products => "products",
            Resource::Revenues => "revenues",
        }
    }

    /// Prefix of the `SERVICE` value, e.g. `customer` in `customer.get`.
    pub fn endpoint(self) -> &'static str {
        match self {
            Resource::Customers => "customer",
            Resource::Invoices => "invoice",
            Resource::RecurringInvoices => "recurring",
            Resource::Products => "article",
            Resource::Revenues => "revenue",
        }
    }

    pub fn response_key(self) -> &'static str {
        match self {
            Resource::Customers => "CUSTOMERS",
            Resource::Invoices | Resource::RecurringInvoices => "INVOICES",
            Resource::Products => "ARTICLES",
            Resource::Revenues => "REVENUES",
        }
    }

    pub fn primary_key(self) -> &'static str {
        match self {
            Resource::Customers => "CUSTOMER_ID",
            Resource::Invoices | Resource::RecurringInvoices | Resource::Revenues => "INVOICE_ID",
            Resource::Products => "ARTICLE_ID",
        }
    }

    pub fn service(self) -> String {
        format!("{}.get", self.endpoint())
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Resource::ALL
            .into_iter()
            .find(|r| r.name() == name.trim())
            .ok_or_else(|| EtlError::InvalidConfigValueError {
                field: "streams".to_string(),
                value: name.to_string(),
                reason: format!(
                    "Unknown stream. Available streams: {}",
                    Resource::ALL.map(Resource::name).join(", ")
                ),
            })
    }

    /// Resolves a stream selection; an empty selection means every stream.
    /// The result always follows catalog order, without duplicates.
    pub fn select(names: &[String]) -> Result<Vec<Resource>> {
        if names.is_empty() {
            return Ok(Resource::ALL.to_vec());
        }

        let mut wanted = Vec::with_capacity(names.len());
        for name in names {
            wanted.push(Resource::from_name(name)?);
        }

        Ok(Resource::ALL
            .into_iter()
            .filter(|r| wanted.contains(r))
            .collect())
    }

    pub fn descriptor(self) -> StreamDescriptor {
        StreamDescriptor {
            name: self.name().to_string(),
            primary_key: self.primary_key().to_string(),
            supported_sync_modes: vec!["full_refresh".to_string()],
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
