mod support;

use checkout_payments::codec::aes;
use checkout_payments::processors::{easypaisa, postex, PaymentProcessor, TransactionParameters};
use support::{config, sample_basket};

fn redirect_url(parameters: &TransactionParameters) -> &str {
    match parameters {
        TransactionParameters::RedirectUrl { payment_page_url } => payment_page_url,
        TransactionParameters::Intent { .. } => panic!("expected a redirect URL"),
    }
}

#[tokio::test]
async fn easypaisa_redirect_carries_a_decryptable_sorted_hash() {
    let hash_key = "0123456789abcdef";
    let processor = easypaisa::EasyPaisa {
        public_base_url: "https://shop.example".to_string(),
    };
    let cfg = config(
        "easypaisa",
        &[
            ("hash_key", hash_key),
            ("store_id", "4217"),
            ("payment_method", "MA_PAYMENT_METHOD"),
            ("api_url", "https://easypay.example/Index.jsf"),
        ],
    );
    let basket = sample_basket();

    let transaction = processor
        .build_transaction_parameters(&basket, &Default::default(), &cfg)
        .await
        .unwrap();

    assert_eq!(transaction.transaction_id, basket.order_number);

    let page_url = url::Url::parse(redirect_url(&transaction.parameters)).unwrap();
    let query: Vec<(String, String)> = page_url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    // Redirect fields travel lexicographically sorted.
    let mut keys: Vec<&str> = query.iter().map(|(k, _)| k.as_str()).collect();
    let sorted = {
        let mut s = keys.clone();
        s.sort_unstable();
        s
    };
    assert_eq!(keys, sorted);
    keys.dedup();
    assert_eq!(keys.len(), 12);

    let encrypted = query
        .iter()
        .find(|(k, _)| k == "encryptedHashRequest")
        .map(|(_, v)| v.clone())
        .unwrap();

    let plaintext = aes::decrypt(hash_key.as_bytes(), &encrypted).unwrap();
    assert!(plaintext.starts_with("amount=150000"));
    assert!(plaintext.contains(&format!("orderRefNum={}", basket.order_number)));
    assert!(plaintext.contains("storeId=4217"));
    // The provider hashes over the raw URL and timestamp, so `:` and `/`
    // must not be escaped inside the encrypted blob.
    assert!(plaintext.contains("postBackURL=https://shop.example/postback/easypaisa"));
    assert!(!plaintext.contains("%3A") && !plaintext.contains("%2F"));
}

#[tokio::test]
async fn postex_url_preserves_literal_field_order() {
    let processor = postex::PostEx {
        public_base_url: "https://shop.example".to_string(),
    };
    let cfg = config(
        "postex",
        &[
            ("merchant_code", "M-77"),
            ("url", "https://postex.example/ecommerce/checkout?"),
            ("key", "pk_live_abc"),
        ],
    );
    let basket = sample_basket();

    let transaction = processor
        .build_transaction_parameters(&basket, &Default::default(), &cfg)
        .await
        .unwrap();

    let page_url = redirect_url(&transaction.parameters);
    assert!(page_url.starts_with("https://postex.example/ecommerce/checkout?"));

    // This provider validates field order, not a sorted hash.
    let name_pos = page_url.find("customerName=").unwrap();
    let amount_pos = page_url.find("amount=").unwrap();
    let key_pos = page_url.find("apiKey=").unwrap();
    let ref_pos = page_url.find("orderRefNum=").unwrap();
    assert!(name_pos < amount_pos && amount_pos < key_pos && key_pos < ref_pos);

    assert!(page_url.contains("merchantCode=M-77"));
    assert!(page_url.contains(&format!("orderRefNum={}", basket.order_number)));
}

#[tokio::test]
async fn missing_configuration_fails_before_building_anything() {
    let processor = easypaisa::EasyPaisa {
        public_base_url: "https://shop.example".to_string(),
    };
    let cfg = config("easypaisa", &[("store_id", "4217")]);

    let err = processor
        .build_transaction_parameters(&sample_basket(), &Default::default(), &cfg)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("easypaisa/hash_key"));
}
