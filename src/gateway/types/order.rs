//! Order request DTOs

use serde::Deserialize;
use utoipa::ToSchema;

/// Body of `POST /orders`
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    #[schema(example = 1)]
    pub product_id: i64,
    /// Units to purchase, at least 1
    #[schema(example = 2)]
    pub quantity: i32,
    #[schema(example = "buyer-42")]
    pub buyer_id: String,
}

impl CreateOrderRequest {
    /// Validate field ranges; deserialization already enforced types.
    pub fn validate(&self) -> Result<(), String> {
        if self.product_id < 1 {
            return Err("product_id is required".to_string());
        }
        if self.quantity < 1 {
            return Err("quantity must be at least 1".to_string());
        }
        if self.buyer_id.is_empty() {
            return Err("buyer_id is required".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(product_id: i64, quantity: i32, buyer_id: &str) -> CreateOrderRequest {
        CreateOrderRequest {
            product_id,
            quantity,
            buyer_id: buyer_id.to_string(),
        }
    }

    #[test]
    fn accepts_well_formed_requests() {
        assert!(req(1, 1, "u").validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_fields() {
        assert!(req(0, 1, "u").validate().is_err());
        assert!(req(1, 0, "u").validate().is_err());
        assert!(req(1, -3, "u").validate().is_err());
        assert!(req(1, 1, "").validate().is_err());
    }
}
