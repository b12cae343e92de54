//! Page-based slicing for list operations.

use crate::constants::{DEFAULT_PER_PAGE, MAX_PER_PAGE};
use crate::models::{
    Asset, Currency, Invoice, MaintenanceRequest, Payment, PaymentMode, PaymentType, Property,
    RentalUnit, Role, Tenant, UserView,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// `?page=&per_page=` query parameters. Out-of-range values are clamped, not rejected.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageRequest {
    /// 1-based page number (default 1).
    pub page: Option<u32>,
    /// Items per page, 1..=100 (default 25).
    pub per_page: Option<u32>,
}

impl PageRequest {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
        }
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PageMeta {
    pub page: u32,
    pub per_page: u32,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[aliases(
    CurrencyPage = Page<Currency>,
    PaymentTypePage = Page<PaymentType>,
    PaymentModePage = Page<PaymentMode>,
    RolePage = Page<Role>,
    UserPage = Page<UserView>,
    PropertyPage = Page<Property>,
    RentalUnitPage = Page<RentalUnit>,
    TenantPage = Page<Tenant>,
    AssetPage = Page<Asset>,
    MaintenanceRequestPage = Page<MaintenanceRequest>,
    InvoicePage = Page<Invoice>,
    PaymentPage = Page<Payment>,
)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    /// Slice an already-ordered list.
    pub fn from_ordered(items: Vec<T>, request: &PageRequest) -> Self {
        let page = request.page();
        let per_page = request.per_page();
        let total = items.len();
        let skip = (page as usize - 1).saturating_mul(per_page as usize);
        let data = items.into_iter().skip(skip).take(per_page as usize).collect();

        Self {
            data,
            meta: PageMeta {
                page,
                per_page,
                total,
            },
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}
