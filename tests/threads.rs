//! Resolution from other threads, awaited on a real executor.

use settle::prelude::*;
use settle::{pair, spawn};

use std::thread;
use tokio::time::{sleep, Duration};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn resolve_from_another_thread() {
    let (promise, awaiter) = pair();
    let producer = thread::spawn(move || {
        thread::sleep(std::time::Duration::from_millis(20));
        promise.resolve(String::from("hello"));
    });
    assert_eq!(awaiter.await, "hello");
    producer.join().unwrap();
}

#[tokio::test]
async fn all_across_threads() {
    let (promises, awaiters): (Vec<_>, Vec<_>) = (0..8).map(|_| pair::<usize>()).unzip();
    let producers: Vec<_> = promises
        .into_iter()
        .enumerate()
        .rev()
        .map(|(index, promise)| thread::spawn(move || promise.resolve(index)))
        .collect();

    let values = awaiters.all().await;
    assert_eq!(values, (0..8).collect::<Vec<_>>());
    for producer in producers {
        producer.join().unwrap();
    }
}

#[tokio::test]
async fn chained_computation_resumes_on_resolving_thread() {
    let (promise, awaiter) = pair::<u32>();
    let out = spawn(async move {
        let value = awaiter.await;
        (value, thread::current().id())
    });

    let producer = thread::spawn(move || {
        promise.resolve(3);
        thread::current().id()
    });
    let resolver = producer.join().unwrap();

    sleep(Duration::from_millis(1)).await;
    assert_eq!(out.await, (3, resolver));
}
