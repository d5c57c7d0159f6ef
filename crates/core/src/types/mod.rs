//! Core types for Bazaar.
//!
//! This module provides type-safe wrappers and plain data for the storefront
//! domain: ids, money, catalog, cart, checkout and the visitor's account.

pub mod address;
pub mod cart;
pub mod checkout;
pub mod email;
pub mod id;
pub mod notice;
pub mod order;
pub mod price;
pub mod pricing;
pub mod product;
pub mod status;
pub mod user;
pub mod validation;
pub mod wishlist;

pub use address::{Address, AddressInput, AddressType};
pub use cart::{CartItem, CartSelection, QuantityChange, selected_items};
pub use checkout::{Advance, CheckoutError, CheckoutSnapshot, CheckoutStep, CheckoutWizard};
pub use email::{Email, EmailError};
pub use id::*;
pub use notice::{Notice, NoticeLevel, Notices};
pub use order::{Order, OrderFilter};
pub use price::{CurrencyCode, round_money};
pub use pricing::{
    CartTotals, FREE_SHIPPING_THRESHOLD, PricedLine, TAX_RATE_PERCENT, discounted_line_total,
};
pub use product::{
    AdditionalField, AdditionalSection, CatalogEntity, CatalogEntityType, Product,
    ProductAttribute, ProductDimensions, ProductDraft, ProductFilter, ProductImage,
    ProductVariant,
};
pub use status::*;
pub use user::{
    LoginInput, PasswordResetInput, ProfileUpdate, RoleAccount, RoleSet, SignupInput, UserProfile,
};
pub use validation::FieldErrors;
pub use wishlist::WishlistItem;
