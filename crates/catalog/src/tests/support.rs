use shared::domain::{Product, ProductId};

pub fn product(id: i64, title: &str, price: f64, rating: f64, category: &str) -> Product {
    Product {
        id: ProductId(id),
        title: title.to_string(),
        description: String::new(),
        price,
        discount_percentage: 0.0,
        rating,
        stock: 10,
        brand: String::new(),
        category: category.to_string(),
        thumbnail: format!("https://cdn.example.test/{id}.png"),
        images: Vec::new(),
    }
}

/// `count` products with ids `0..count` in id order.
pub fn numbered(count: i64) -> Vec<Product> {
    (0..count)
        .map(|id| product(id, &format!("Product {id:02}"), 10.0 + id as f64, 4.0, "misc"))
        .collect()
}
