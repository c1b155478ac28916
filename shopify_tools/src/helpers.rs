/// Shopify REST ids are plain integers, but GraphQL wants global ids.
pub fn order_gid(order_id: u64) -> String {
    format!("gid://shopify/Order/{order_id}")
}

/// Parse a REST order id. Returns `None` for anything that is not a positive integer.
pub fn parse_order_id(id: &str) -> Option<u64> {
    let id = id.trim().strip_prefix("gid://shopify/Order/").unwrap_or(id.trim());
    id.parse::<u64>().ok().filter(|v| *v > 0)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn order_ids() {
        assert_eq!(order_gid(5512), "gid://shopify/Order/5512");
        assert_eq!(parse_order_id("5512"), Some(5512));
        assert_eq!(parse_order_id("gid://shopify/Order/77"), Some(77));
        assert_eq!(parse_order_id("#1001"), None);
        assert_eq!(parse_order_id("0"), None);
        assert_eq!(parse_order_id(""), None);
    }
}
