//
//  bitbucket-ingest
//  tests/gateway.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

use std::collections::HashSet;

use bitbucket_ingest::api::client::{ApiEndpoints, RequestOptions};
use bitbucket_ingest::api::cloud::{PullRequest, PullRequestQuery};
use bitbucket_ingest::api::{ApiError, BitbucketClient, BitbucketGateway};
use bitbucket_ingest::approval::collect_for_pull_request;
use bitbucket_ingest::auth::{CredentialPool, ScopeRequirements};
use bitbucket_ingest::config::IngestConfig;
use bitbucket_ingest::ingest::IngestClient;
use mockito::{Matcher, Server, ServerGuard};
use serde_json::{json, Value};

fn gateway(server: &ServerGuard, tokens: &[&str]) -> BitbucketGateway {
    let pool = CredentialPool::from_tokens(tokens.iter().map(|t| t.to_string()).collect())
        .expect("pool");
    let client =
        BitbucketClient::new(ApiEndpoints::rooted_at(&server.url()), pool).expect("client");
    BitbucketGateway::new(client)
}

fn repo(n: u32) -> Value {
    json!({
        "uuid": format!("{{repo-{}}}", n),
        "name": format!("Repo {}", n),
        "slug": format!("repo-{}", n),
        "full_name": format!("acme/repo-{}", n)
    })
}

fn page(values: Vec<Value>, next: Option<String>) -> String {
    let mut body = json!({ "values": values, "pagelen": 2 });
    if let Some(next) = next {
        body["next"] = Value::String(next);
    }
    body.to_string()
}

fn commit(hash: &str, parents: &[&str], author: &str) -> Value {
    json!({
        "hash": hash,
        "parents": parents.iter().map(|p| json!({ "hash": p })).collect::<Vec<_>>(),
        "author": { "raw": format!("{} <{}@example.com>", author, author), "user": { "uuid": author } },
        "message": format!("commit {}", hash)
    })
}

#[tokio::test]
async fn test_pages_are_emitted_in_order() {
    let mut server = Server::new_async().await;
    let url = server.url();

    let first = server
        .mock("GET", "/api/2.0/repositories/acme")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(page(
            vec![repo(1), repo(2)],
            Some(format!("{}/api/2.0/repositories/acme?page=2", url)),
        ))
        .expect(1)
        .create_async()
        .await;
    let second = server
        .mock("GET", "/api/2.0/repositories/acme?page=2")
        .with_status(200)
        .with_body(page(
            vec![repo(3), repo(4)],
            Some(format!("{}/api/2.0/repositories/acme?page=3", url)),
        ))
        .expect(1)
        .create_async()
        .await;
    let third = server
        .mock("GET", "/api/2.0/repositories/acme?page=3")
        .with_status(200)
        .with_body(page(vec![repo(5)], None))
        .expect(1)
        .create_async()
        .await;

    let gateway = gateway(&server, &["tok-1"]);
    let repos = gateway.repositories("acme").await.unwrap();

    let slugs: Vec<&str> = repos.iter().map(|r| r.repo_slug()).collect();
    assert_eq!(slugs, vec!["repo-1", "repo-2", "repo-3", "repo-4", "repo-5"]);
    assert_eq!(gateway.calls().repositories, 3);

    first.assert_async().await;
    second.assert_async().await;
    third.assert_async().await;
}

#[tokio::test]
async fn test_rate_limit_rotates_to_next_credential() {
    let mut server = Server::new_async().await;
    let url = server.url();

    let first = server
        .mock("GET", "/api/2.0/repositories/acme")
        .match_header("authorization", "Bearer tok-1")
        .with_status(200)
        .with_body(page(
            vec![repo(1), repo(2)],
            Some(format!("{}/api/2.0/repositories/acme?page=2", url)),
        ))
        .expect(1)
        .create_async()
        .await;
    let second = server
        .mock("GET", "/api/2.0/repositories/acme?page=2")
        .match_header("authorization", "Bearer tok-1")
        .with_status(200)
        .with_body(page(
            vec![repo(3), repo(4)],
            Some(format!("{}/api/2.0/repositories/acme?page=3", url)),
        ))
        .expect(1)
        .create_async()
        .await;
    let limited = server
        .mock("GET", "/api/2.0/repositories/acme?page=3")
        .match_header("authorization", "Bearer tok-1")
        .with_status(429)
        .expect(1)
        .create_async()
        .await;
    let retried = server
        .mock("GET", "/api/2.0/repositories/acme?page=3")
        .match_header("authorization", "Bearer tok-2")
        .with_status(200)
        .with_body(page(vec![repo(5), repo(6)], None))
        .expect(1)
        .create_async()
        .await;

    let gateway = gateway(&server, &["tok-1", "tok-2"]);
    let repos = gateway.repositories("acme").await.unwrap();

    assert_eq!(repos.len(), 6);
    assert_eq!(repos[5].repo_slug(), "repo-6");
    assert_eq!(gateway.client().active_credential().await, 1);

    first.assert_async().await;
    second.assert_async().await;
    limited.assert_async().await;
    retried.assert_async().await;
}

#[tokio::test]
async fn test_rate_limit_on_last_credential() {
    let mut server = Server::new_async().await;

    let limited = server
        .mock("GET", "/api/2.0/workspaces/acme")
        .with_status(429)
        .expect(2)
        .create_async()
        .await;

    let gateway = gateway(&server, &["tok-1", "tok-2"]);
    let err = gateway.workspace("acme").await.unwrap_err();

    match err {
        ApiError::RetriesExceeded { message, .. } => {
            assert!(message.contains("add another set of key/secret credentials"));
        }
        other => panic!("unexpected error: {other}"),
    }
    limited.assert_async().await;
}

#[tokio::test]
async fn test_legacy_groups_are_a_single_page() {
    let mut server = Server::new_async().await;

    let groups = server
        .mock("GET", "/api/1.0/groups/acme")
        .with_status(200)
        .with_body(
            json!([
                { "name": "Developers", "slug": "developers", "permission": "write",
                  "members": [{ "uuid": "{u1}", "display_name": "Jane" }] },
                { "name": "Admins", "slug": "admins", "permission": "admin", "members": [] }
            ])
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let gateway = gateway(&server, &["tok-1"]);
    let result = gateway.groups("acme").await.unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(result[0].members[0].id(), Some("{u1}"));
    assert_eq!(gateway.calls().groups, 1);
    groups.assert_async().await;
}

#[tokio::test]
async fn test_next_link_off_base_is_rejected() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("GET", "/api/2.0/workspaces")
        .with_status(200)
        .with_body(page(
            vec![],
            Some("https://evil.example.com/api/2.0/workspaces?page=2".to_string()),
        ))
        .create_async()
        .await;

    let gateway = gateway(&server, &["tok-1"]);
    let err = gateway.workspaces().await.unwrap_err();
    assert!(matches!(err, ApiError::Protocol(_)));
}

#[tokio::test]
async fn test_not_found_handling() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("GET", "/api/2.0/workspaces/ghost")
        .with_status(404)
        .create_async()
        .await;

    let filter: String =
        url::form_urlencoded::byte_serialize(PullRequestQuery::default().to_bbql().as_bytes())
            .collect();
    let prs = server
        .mock(
            "GET",
            format!("/api/2.0/repositories/acme/no-prs/pullrequests?q={}", filter).as_str(),
        )
        .with_status(404)
        .expect(1)
        .create_async()
        .await;

    let gateway = gateway(&server, &["tok-1"]);

    let err = gateway.workspace("ghost").await.unwrap_err();
    assert!(matches!(err, ApiError::ResourceNotFound(_)));
    assert!(err.to_string().contains("verify the workspace"));

    let listed = gateway
        .pull_requests("acme", "no-prs", &PullRequestQuery::default())
        .await
        .unwrap();
    assert!(listed.is_empty());
    assert_eq!(gateway.calls().pull_requests, 0);
    prs.assert_async().await;
}

#[tokio::test]
async fn test_provider_error_carries_status_and_message() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("GET", "/api/2.0/repositories/acme/api")
        .with_status(500)
        .with_body(r#"{"type": "error", "error": {"message": "Something broke"}}"#)
        .create_async()
        .await;

    let gateway = gateway(&server, &["tok-1"]);
    let err = gateway.repository("acme", "api").await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert!(err.to_string().contains("Something broke"));
}

#[tokio::test]
async fn test_requests_before_authentication_fail() {
    let server = Server::new_async().await;
    let pool = CredentialPool::from_config_strings("key1", "secret1").unwrap();
    let client = BitbucketClient::new(ApiEndpoints::rooted_at(&server.url()), pool).unwrap();

    let err = client
        .get_text("workspaces/acme", RequestOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::IllegalState(_)));
}

#[tokio::test]
async fn test_client_credentials_exchange() {
    let mut server = Server::new_async().await;

    let first = server
        .mock("POST", "/site/oauth2/access_token")
        .match_header("authorization", "Basic a2V5MTpzZWNyZXQx")
        .match_body(Matcher::UrlEncoded(
            "grant_type".into(),
            "client_credentials".into(),
        ))
        .with_status(200)
        .with_body(r#"{"access_token": "tok-1", "scopes": "account project pullrequest"}"#)
        .expect(1)
        .create_async()
        .await;
    let second = server
        .mock("POST", "/site/oauth2/access_token")
        .match_header("authorization", "Basic a2V5MjpzZWNyZXQy")
        .with_status(200)
        .with_body(r#"{"access_token": "tok-2", "scopes": "account project pullrequest"}"#)
        .expect(1)
        .create_async()
        .await;
    let workspace = server
        .mock("GET", "/api/2.0/workspaces/acme")
        .match_header("authorization", "Bearer tok-1")
        .with_status(200)
        .with_body(r#"{"uuid": "{ws}", "slug": "acme", "name": "Acme"}"#)
        .expect(1)
        .create_async()
        .await;

    let pool = CredentialPool::from_config_strings("key1, key2", "secret1, secret2").unwrap();
    let client = BitbucketClient::new(ApiEndpoints::rooted_at(&server.url()), pool).unwrap();
    client
        .authenticate(&ScopeRequirements {
            pull_requests: true,
            workspace_hint: Some("acme".to_string()),
        })
        .await
        .unwrap();

    let gateway = BitbucketGateway::new(client);
    assert_eq!(gateway.workspace("acme").await.unwrap().name, "Acme");

    first.assert_async().await;
    second.assert_async().await;
    workspace.assert_async().await;
}

#[tokio::test]
async fn test_missing_scope_fails_authentication() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("POST", "/site/oauth2/access_token")
        .with_status(200)
        .with_body(r#"{"access_token": "tok-1", "scopes": "account project"}"#)
        .create_async()
        .await;

    let pool = CredentialPool::from_config_strings("key1", "secret1").unwrap();
    let client = BitbucketClient::new(ApiEndpoints::rooted_at(&server.url()), pool).unwrap();
    let err = client
        .authenticate(&ScopeRequirements {
            pull_requests: true,
            workspace_hint: Some("acme".to_string()),
        })
        .await
        .unwrap_err();

    match err {
        ApiError::Authentication { ordinal, message, .. } => {
            assert_eq!(ordinal, 0);
            assert!(message.contains("Pull requests"));
            assert!(message.contains("https://bitbucket.org/acme/workspace/settings/api"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_rejected_token_request() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("POST", "/site/oauth2/access_token")
        .with_status(401)
        .create_async()
        .await;

    let pool = CredentialPool::from_config_strings("key1", "secret1").unwrap();
    let client = BitbucketClient::new(ApiEndpoints::rooted_at(&server.url()), pool).unwrap();
    let err = client
        .authenticate(&ScopeRequirements::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Authentication { ordinal: 0, .. }));
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_forbidden_permissions_are_skipped() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("GET", "/api/2.0/repositories/acme/api/permissions-config/groups")
        .with_status(403)
        .create_async()
        .await;
    let _mock = server
        .mock("GET", "/api/2.0/repositories/acme/api/branch-restrictions")
        .with_status(500)
        .create_async()
        .await;

    let client = IngestClient::new(gateway(&server, &["tok-1"]), IngestConfig::default());

    let mut handled = 0;
    client
        .iterate_repository_group_permissions("acme", "api", |_| {
            handled += 1;
            Ok(())
        })
        .await
        .unwrap();
    assert_eq!(handled, 0);

    let err = client
        .iterate_branch_restrictions("acme", "api", |_| Ok(()))
        .await
        .unwrap_err();
    assert_eq!(err.downcast_ref::<ApiError>().and_then(ApiError::status), Some(500));
}

#[tokio::test]
async fn test_pull_request_approvals_end_to_end() {
    let mut server = Server::new_async().await;

    // Newest first, as the commits endpoint returns them
    let _mock = server
        .mock("GET", "/api/2.0/repositories/acme/api/commits/cccc3333?exclude=main0000")
        .with_status(200)
        .with_body(page(
            vec![
                commit("cccc3333", &["mmmm0000"], "{dev}"),
                commit("mmmm0000", &["aaaa1111", "main0000"], "{dev}"),
                commit("aaaa1111", &["main0000"], "{outsider}"),
            ],
            None,
        ))
        .create_async()
        .await;
    let _mock = server
        .mock("GET", "/api/2.0/repositories/acme/api/pullrequests/7/activity")
        .with_status(200)
        .with_body(page(
            vec![
                json!({ "approval": {
                    "date": "2024-05-02T10:00:00+00:00",
                    "user": { "uuid": "{reviewer}", "display_name": "Rita" },
                    "pullrequest": { "id": 7, "source": { "branch": { "name": "feature" }, "commit": { "hash": "cccc3333" } } }
                }}),
                json!({ "update": {
                    "date": "2024-05-01T10:00:00+00:00",
                    "state": "OPEN",
                    "source": { "branch": { "name": "feature" }, "commit": { "hash": "cccc3333" } },
                    "destination": { "branch": { "name": "main" }, "commit": { "hash": "main0000" } }
                }}),
            ],
            None,
        ))
        .create_async()
        .await;
    let diff = server
        .mock("GET", "/api/2.0/repositories/acme/api/diff/mmmm0000..main0000")
        .with_status(200)
        .with_body("")
        .expect(1)
        .create_async()
        .await;

    let pr: PullRequest = serde_json::from_value(json!({
        "id": 7,
        "title": "Feature",
        "state": "OPEN",
        "source": { "branch": { "name": "feature" }, "commit": { "hash": "cccc3333" } },
        "destination": { "branch": { "name": "main" }, "commit": { "hash": "main0000" } }
    }))
    .unwrap();

    let gateway = gateway(&server, &["tok-1"]);
    let known: HashSet<String> = ["{dev}".to_string()].into_iter().collect();

    let result = collect_for_pull_request(&gateway, "acme", "api", &pr, &known, true)
        .await
        .unwrap();

    let all: Vec<&str> = result.all_commits.iter().map(|c| c.hash.as_str()).collect();
    assert_eq!(all, vec!["aaaa1111", "cccc3333"]);

    let approved: Vec<&str> = result.approved_commits.iter().map(|c| c.hash.as_str()).collect();
    assert_eq!(approved, vec!["aaaa1111", "cccc3333"]);

    let unknown: Vec<&str> = result
        .commits_by_unknown_author
        .iter()
        .map(|c| c.hash.as_str())
        .collect();
    assert_eq!(unknown, vec!["aaaa1111"]);

    assert_eq!(result.approver_ids(), vec!["{reviewer}"]);
    assert!(!result.approved_commits_removed);

    let calls = gateway.calls();
    assert_eq!(calls.commits, 1);
    assert_eq!(calls.pull_request_activity, 1);
    assert_eq!(calls.diff, 1);
    diff.assert_async().await;
}

#[tokio::test]
async fn test_known_identities_from_members() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("GET", "/api/2.0/workspaces/acme/members")
        .with_status(200)
        .with_body(page(
            vec![
                json!({ "user": { "uuid": "{u1}", "display_name": "Jane" } }),
                json!({ "user": { "display_name": "Deleted user" } }),
                json!({ "user": { "uuid": "{u2}", "display_name": "Tom" } }),
            ],
            None,
        ))
        .expect(1)
        .create_async()
        .await;

    let client = IngestClient::new(gateway(&server, &["tok-1"]), IngestConfig::default());
    let known = client.known_identities("acme").await.unwrap();

    assert_eq!(known.len(), 2);
    assert!(known.contains("{u1}"));
    assert!(known.contains("{u2}"));
    assert_eq!(client.calls().workspace_members, 1);
}

#[tokio::test]
async fn test_pages_before_a_failure_are_counted() {
    let mut server = Server::new_async().await;
    let url = server.url();

    let _first = server
        .mock("GET", "/api/2.0/repositories/acme")
        .with_status(200)
        .with_body(page(
            vec![repo(1)],
            Some(format!("{}/api/2.0/repositories/acme?page=2", url)),
        ))
        .create_async()
        .await;
    let _limited = server
        .mock("GET", "/api/2.0/repositories/acme?page=2")
        .with_status(429)
        .create_async()
        .await;

    let gateway = gateway(&server, &["tok-1"]);
    let err = gateway.repositories("acme").await.unwrap_err();

    assert!(matches!(err, ApiError::RetriesExceeded { .. }));
    assert_eq!(gateway.calls().repositories, 1);
}

#[tokio::test]
async fn test_collect_all_pages_reports_page_count() {
    let mut server = Server::new_async().await;
    let url = server.url();

    let _first = server
        .mock("GET", "/api/2.0/workspaces")
        .with_status(200)
        .with_body(page(
            vec![json!({ "uuid": "{w1}", "slug": "one" })],
            Some(format!("{}/api/2.0/workspaces?page=2", url)),
        ))
        .create_async()
        .await;
    let _second = server
        .mock("GET", "/api/2.0/workspaces?page=2")
        .with_status(200)
        .with_body(page(vec![json!({ "uuid": "{w2}", "slug": "two" })], None))
        .create_async()
        .await;

    let gateway = gateway(&server, &["tok-1"]);
    let collected = gateway
        .client()
        .collect_all_pages::<Value>("workspaces", RequestOptions::default())
        .await
        .unwrap();

    assert_eq!(collected.pages, 2);
    assert_eq!(collected.items.len(), 2);
    assert_eq!(collected.items[1]["slug"], "two");
}

#[tokio::test]
async fn test_object_body_on_legacy_call_is_a_decode_error() {
    let mut server = Server::new_async().await;

    let _mock = server
        .mock("GET", "/api/1.0/groups/acme")
        .with_status(200)
        .with_body(r#"{"type": "error", "error": {"message": "moved"}}"#)
        .create_async()
        .await;

    let gateway = gateway(&server, &["tok-1"]);
    let err = gateway.groups("acme").await.unwrap_err();
    assert!(matches!(err, ApiError::Decode { .. }));
    assert_eq!(gateway.calls().groups, 0);
}

#[tokio::test]
async fn test_unreachable_host_is_a_transport_failure() {
    // Bind and release a port so nothing is listening on it
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let pool = CredentialPool::from_tokens(vec!["tok-1".to_string()]).unwrap();
    let client = BitbucketClient::new(
        ApiEndpoints::rooted_at(&format!("http://127.0.0.1:{}", port)),
        pool,
    )
    .unwrap();

    let err = client
        .get_text("workspaces/acme", RequestOptions::default())
        .await
        .unwrap_err();

    match err {
        ApiError::Provider {
            status,
            status_text,
            endpoint,
        } => {
            assert_eq!(status, None);
            assert!(status_text.starts_with("Transport failure"), "{}", status_text);
            assert!(endpoint.ends_with("/api/2.0/workspaces/acme"));
        }
        other => panic!("unexpected error: {other}"),
    }
}
