use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountObj {
    #[serde(rename = "totalCount")]
    pub total_count: u64,
}

/// Identity and contribution years of a GitHub user.
#[derive(Debug, Clone, PartialEq)]
pub struct UserMetadata {
    pub id: String,
    pub name: Option<String>,
    pub contribution_years: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    pub id: String,
    pub avatar_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitTarget {
    #[serde(default)]
    pub history: Option<CountObj>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultBranchRef {
    #[serde(default)]
    pub target: Option<CommitTarget>,
}

/// Repository descriptor as returned by `commitContributionsByRepository`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    pub owner: Owner,
    pub is_in_organization: bool,
    pub url: String,
    pub homepage_url: Option<String>,
    pub name: String,
    pub name_with_owner: String,
    pub stargazer_count: u64,
    pub open_graph_image_url: String,
    #[serde(default)]
    pub default_branch_ref: Option<DefaultBranchRef>,
}

/// One repository's commit contributions within a single year.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RepositoryContribution {
    pub contributions: CountObj,
    pub repository: Repository,
}

/// A repository with contributions summed over every year.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedRepository {
    #[serde(flatten)]
    pub repository: Repository,
    pub num_of_my_contributions: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributorStats {
    pub id: String,
    pub name: Option<String>,
    pub repositories_contributed_to: Vec<AggregatedRepository>,
}

/// Merge per-year records into one entry per `nameWithOwner`.
///
/// Entries come out in the order their repository was first seen. The
/// descriptor of that first record is kept; later records only add to the
/// count.
pub fn aggregate<I>(records: I) -> Vec<AggregatedRepository>
where
    I: IntoIterator<Item = RepositoryContribution>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<AggregatedRepository> = Vec::new();

    for record in records {
        let count = record.contributions.total_count;

        match index.get(&record.repository.name_with_owner) {
            Some(&slot) => {
                let entry = &mut out[slot];
                if entry.repository != record.repository {
                    tracing::warn!(
                        repository = %entry.repository.name_with_owner,
                        "repository metadata differs between years; keeping first seen"
                    );
                }
                entry.num_of_my_contributions = entry.num_of_my_contributions.saturating_add(count);
            }
            None => {
                index.insert(record.repository.name_with_owner.clone(), out.len());
                out.push(AggregatedRepository {
                    repository: record.repository,
                    num_of_my_contributions: count,
                });
            }
        }
    }

    out
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn repository(name_with_owner: &str) -> Repository {
        let (owner, name) = name_with_owner.split_once('/').unwrap();
        Repository {
            owner: Owner {
                id: format!("MDQ6VXNlcj{owner}"),
                avatar_url: format!("https://avatars.githubusercontent.com/{owner}"),
            },
            is_in_organization: false,
            url: format!("https://github.com/{name_with_owner}"),
            homepage_url: None,
            name: name.to_string(),
            name_with_owner: name_with_owner.to_string(),
            stargazer_count: 42,
            open_graph_image_url: format!("https://opengraph.githubassets.com/{name_with_owner}"),
            default_branch_ref: Some(DefaultBranchRef {
                target: Some(CommitTarget {
                    history: Some(CountObj { total_count: 10 }),
                }),
            }),
        }
    }

    fn record(name_with_owner: &str, total_count: u64) -> RepositoryContribution {
        RepositoryContribution {
            contributions: CountObj { total_count },
            repository: repository(name_with_owner),
        }
    }

    fn find<'a>(out: &'a [AggregatedRepository], key: &str) -> &'a AggregatedRepository {
        out.iter()
            .find(|r| r.repository.name_with_owner == key)
            .unwrap()
    }

    #[test]
    fn sums_counts_across_years() {
        let out = aggregate(vec![
            record("octocat/Hello-World", 3),
            record("octocat/Hello-World", 5),
            record("octocat/Spoon-Knife", 2),
        ]);

        assert_eq!(out.len(), 2);
        assert_eq!(find(&out, "octocat/Hello-World").num_of_my_contributions, 8);
        assert_eq!(find(&out, "octocat/Spoon-Knife").num_of_my_contributions, 2);
    }

    #[test]
    fn no_duplicate_keys() {
        let out = aggregate(vec![
            record("a/x", 1),
            record("b/y", 1),
            record("a/x", 1),
            record("c/z", 0),
            record("b/y", 4),
            record("a/x", 7),
        ]);

        let mut keys: Vec<&str> = out
            .iter()
            .map(|r| r.repository.name_with_owner.as_str())
            .collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), out.len());
        assert_eq!(find(&out, "a/x").num_of_my_contributions, 9);
        assert_eq!(find(&out, "b/y").num_of_my_contributions, 5);
        assert_eq!(find(&out, "c/z").num_of_my_contributions, 0);
    }

    #[test]
    fn keeps_first_seen_order() {
        let out = aggregate(vec![record("b/y", 1), record("a/x", 1), record("b/y", 1)]);
        let keys: Vec<&str> = out
            .iter()
            .map(|r| r.repository.name_with_owner.as_str())
            .collect();
        assert_eq!(keys, ["b/y", "a/x"]);
    }

    #[test]
    fn first_descriptor_wins_when_metadata_diverges() {
        let mut later = record("octocat/Hello-World", 2);
        later.repository.stargazer_count = 9000;

        let out = aggregate(vec![record("octocat/Hello-World", 1), later]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].repository.stargazer_count, 42);
        assert_eq!(out[0].num_of_my_contributions, 3);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(aggregate(Vec::new()).is_empty());
    }

    #[test]
    fn decodes_repository_without_default_branch() {
        let value = json!({
            "contributions": { "totalCount": 4 },
            "repository": {
                "owner": { "id": "O_1", "avatarUrl": "https://a/1" },
                "isInOrganization": true,
                "url": "https://github.com/org/empty",
                "homepageUrl": null,
                "name": "empty",
                "nameWithOwner": "org/empty",
                "stargazerCount": 0,
                "openGraphImageUrl": "https://og/empty",
                "defaultBranchRef": null
            }
        });

        let parsed: RepositoryContribution = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.contributions.total_count, 4);
        assert!(parsed.repository.default_branch_ref.is_none());
        assert!(parsed.repository.is_in_organization);
    }

    #[test]
    fn serializes_with_flattened_descriptor() {
        let stats = ContributorStats {
            id: "MDQ6VXNlcjE=".to_string(),
            name: Some("The Octocat".to_string()),
            repositories_contributed_to: aggregate(vec![record("octocat/Hello-World", 3)]),
        };

        let value = serde_json::to_value(&stats).unwrap();
        let repo = &value["repositoriesContributedTo"][0];
        assert_eq!(value["name"], "The Octocat");
        assert_eq!(repo["nameWithOwner"], "octocat/Hello-World");
        assert_eq!(repo["numOfMyContributions"], 3);
        assert_eq!(repo["stargazerCount"], 42);
        assert_eq!(repo["defaultBranchRef"]["target"]["history"]["totalCount"], 10);
    }
}
