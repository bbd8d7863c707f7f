//! Inward and outward transforms agree on the body encoding.
//!
//! Each property encodes a typed value with an inward transform, feeds the
//! encoded body back as a response and decodes it with the matching
//! outward transform.

use http::StatusCode;
use proptest::prelude::*;
use relay_core::{HttpRequestInput, HttpResponse, InvocationContext};
use relay_middleware::Transform;
use relay_transform::{
    JsonInwardTransform, JsonOptions, JsonOutwardTransform, XmlInwardTransform, XmlOptions,
    XmlOutwardTransform,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Order {
    order_id: String,
    quantity: u32,
    express: bool,
    #[serde(default)]
    notes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    coupon: Option<String>,
}

impl HttpRequestInput for Order {
    type Body = Self;
    type Query = ();

    fn body(&self) -> Option<&Self> {
        Some(self)
    }
}

fn order() -> impl Strategy<Value = Order> {
    (
        "[A-Za-z0-9]{1,16}",
        any::<u32>(),
        any::<bool>(),
        proptest::collection::vec("[a-z]{1,10}", 0..5),
        proptest::option::of("[A-Z]{3,8}"),
    )
        .prop_map(|(order_id, quantity, express, notes, coupon)| Order {
            order_id,
            quantity,
            express,
            notes,
            coupon,
        })
}

fn echo(body: &[u8]) -> HttpResponse {
    HttpResponse::new(StatusCode::OK, body.to_vec())
}

proptest! {
    #[test]
    fn prop_json_round_trip(original in order()) {
        let ctx = InvocationContext::new();
        let request = JsonInwardTransform::new("/orders", &JsonOptions::default())
            .transform(original.clone(), &ctx)
            .unwrap();

        let decoded = JsonOutwardTransform::<Order>::new()
            .transform(echo(request.body()), &ctx)
            .unwrap();

        prop_assert_eq!(decoded, original);
    }

    #[test]
    fn prop_xml_round_trip(original in order()) {
        let ctx = InvocationContext::new();
        let options = XmlOptions::default();
        let request = XmlInwardTransform::new("/orders", &options)
            .transform(original.clone(), &ctx)
            .unwrap();

        let decoded = XmlOutwardTransform::<Order>::new(&options)
            .transform(echo(request.body()), &ctx)
            .unwrap();

        prop_assert_eq!(decoded, original);
    }
}
