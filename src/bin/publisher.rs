use chrono::{Duration, Utc};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use order_ingest::config::Config;
use order_ingest::domain::order::{encode, Delivery, Item, Order, Payment};
use order_ingest::messaging::OrderPublisher;

// Sends a handful of sample orders to the orders topic, one every
// PUBLISH_INTERVAL_MS, so the service has something to ingest.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    tracing::info!(brokers = %config.kafka_brokers, topic = %config.kafka_topic, "Starting publisher");

    let publisher = OrderPublisher::new(&config.kafka_brokers)?;
    let orders = sample_orders();
    let total = orders.len();

    for (i, order) in orders.iter().enumerate() {
        let payload = encode(order)?;

        if let Err(e) = publisher.publish(&config.kafka_topic, &order.order_uid, &payload).await {
            tracing::error!(order_uid = %order.order_uid, error = %e, "Failed to publish order");
            continue;
        }
        tracing::info!("[{}/{}] Order {} published", i + 1, total, order.order_uid);

        if i + 1 < total {
            tokio::time::sleep(config.publish_interval).await;
        }
    }

    tracing::info!("All orders published");
    Ok(())
}

fn sample_orders() -> Vec<Order> {
    let now = Utc::now();
    let suffix = uuid::Uuid::new_v4().simple().to_string();

    vec![
        Order {
            order_uid: format!("b563feb7b2b84b6{}", &suffix[..8]),
            track_number: "WBILMTESTTRACK".to_string(),
            entry: "WBIL".to_string(),
            delivery: Delivery {
                name: "Test Testov".to_string(),
                phone: "+9720000000".to_string(),
                zip: "2639809".to_string(),
                city: "Kiryat Mozkin".to_string(),
                address: "Ploshad Mira 15".to_string(),
                region: "Kraiot".to_string(),
                email: "test@gmail.com".to_string(),
            },
            payment: Payment {
                transaction: "b563feb7b2b84b6test".to_string(),
                currency: "USD".to_string(),
                provider: "wbpay".to_string(),
                amount: 1817,
                payment_dt: 1637907727,
                bank: "alpha".to_string(),
                delivery_cost: 1500,
                goods_total: 317,
                ..Default::default()
            },
            items: vec![Item {
                chrt_id: 9934930,
                track_number: "WBILMTESTTRACK".to_string(),
                price: 453,
                rid: "ab4219087a764ae0btest".to_string(),
                name: "Mascaras".to_string(),
                sale: 30,
                size: "0".to_string(),
                total_price: 317,
                nm_id: 2389212,
                brand: "Vivienne Sabo".to_string(),
                status: 202,
            }],
            locale: "en".to_string(),
            customer_id: "test".to_string(),
            delivery_service: "meest".to_string(),
            shardkey: "9".to_string(),
            sm_id: 99,
            date_created: now,
            oof_shard: "1".to_string(),
            ..Default::default()
        },
        Order {
            order_uid: format!("a462fec8c3c95c7{}", &suffix[8..16]),
            track_number: "RUEXPDEMO123".to_string(),
            entry: "RUEXP".to_string(),
            delivery: Delivery {
                name: "Ivan Ivanov".to_string(),
                phone: "+79161234567".to_string(),
                zip: "101000".to_string(),
                city: "Moscow".to_string(),
                address: "Tverskaya st. 10".to_string(),
                region: "Moscow".to_string(),
                email: "ivanov@mail.ru".to_string(),
            },
            payment: Payment {
                transaction: "a462fec8c3c95c7demo".to_string(),
                request_id: "req_12345".to_string(),
                currency: "RUB".to_string(),
                provider: "sberpay".to_string(),
                amount: 5420,
                payment_dt: 1637911127,
                bank: "sber".to_string(),
                delivery_cost: 500,
                goods_total: 4920,
                custom_fee: 0,
            },
            items: vec![
                Item {
                    chrt_id: 8847531,
                    track_number: "RUEXPDEMO123".to_string(),
                    price: 2460,
                    rid: "cd5320198b875bf1demo".to_string(),
                    name: "Smartphone Case".to_string(),
                    sale: 10,
                    size: "M".to_string(),
                    total_price: 2214,
                    nm_id: 5421897,
                    brand: "CaseMaster".to_string(),
                    status: 202,
                },
                Item {
                    chrt_id: 8847532,
                    track_number: "RUEXPDEMO123".to_string(),
                    price: 1500,
                    rid: "ef6431209c986cg2demo".to_string(),
                    name: "Screen Protector".to_string(),
                    sale: 20,
                    size: "Universal".to_string(),
                    total_price: 1200,
                    nm_id: 5421898,
                    brand: "GlassPro".to_string(),
                    status: 202,
                },
            ],
            locale: "ru".to_string(),
            internal_signature: "demo_signature".to_string(),
            customer_id: "demo_user".to_string(),
            delivery_service: "russian-post".to_string(),
            shardkey: "5".to_string(),
            sm_id: 42,
            date_created: now - Duration::hours(1),
            oof_shard: "2".to_string(),
        },
        Order {
            order_uid: format!("c573ffd9d4da6d8{}", &suffix[16..24]),
            track_number: "USPS SAMPLE456".to_string(),
            entry: "USPS".to_string(),
            delivery: Delivery {
                name: "John Smith".to_string(),
                phone: "+12025550123".to_string(),
                zip: "10001".to_string(),
                city: "New York".to_string(),
                address: "5th Avenue 123".to_string(),
                region: "NY".to_string(),
                email: "john.smith@example.com".to_string(),
            },
            payment: Payment {
                transaction: "c573ffd9d4da6d8sample".to_string(),
                request_id: "req_67890".to_string(),
                currency: "USD".to_string(),
                provider: "stripe".to_string(),
                amount: 8999,
                payment_dt: 1637914527,
                bank: "chase".to_string(),
                delivery_cost: 0,
                goods_total: 8999,
                custom_fee: 0,
            },
            items: vec![Item {
                chrt_id: 7756420,
                track_number: "USPS SAMPLE456".to_string(),
                price: 8999,
                rid: "hi8653421eb1a8ei4sample".to_string(),
                name: "Wireless Headphones".to_string(),
                sale: 0,
                size: "One Size".to_string(),
                total_price: 8999,
                nm_id: 6654321,
                brand: "AudioPro".to_string(),
                status: 202,
            }],
            locale: "en".to_string(),
            customer_id: "john_sample".to_string(),
            delivery_service: "usps".to_string(),
            shardkey: "3".to_string(),
            sm_id: 77,
            date_created: now - Duration::hours(2),
            oof_shard: "1".to_string(),
            ..Default::default()
        },
    ]
}
