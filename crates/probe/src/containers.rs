use crate::Error;
use crate::services::run;
use serde::Serialize;
use std::time::Duration;

const DOCKER_TIMEOUT: Duration = Duration::from_secs(5);
const PS_FORMAT: &str = "{{.Names}}|{{.Status}}|{{.ID}}";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Container {
    pub name: String,
    pub status: String,
    pub id: String,
}

/// Running containers as reported by `docker ps`.
pub async fn list_containers() -> Result<Vec<Container>, Error> {
    let output = run("docker", &["ps", "--format", PS_FORMAT], DOCKER_TIMEOUT).await?;
    if !output.status.success() {
        return Err(Error::CommandFailed {
            program: "docker",
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(parse_ps_output(&String::from_utf8_lossy(&output.stdout)))
}

/// Parse `docker ps` lines in [`PS_FORMAT`]; lines with fewer than three
/// fields are skipped.
fn parse_ps_output(stdout: &str) -> Vec<Container> {
    stdout
        .lines()
        .filter_map(|line| {
            let mut fields = line.split('|');
            let name = fields.next()?.trim();
            let status = fields.next()?.trim();
            let id = fields.next()?.trim();
            (!name.is_empty()).then(|| Container {
                name: name.to_string(),
                status: status.to_string(),
                id: id.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_ps_lines_and_skips_garbage() {
        let stdout = "web|Up 3 hours|a1b2c3\n\nbroken line\ndb|Up 2 days (healthy)|d4e5f6\n";
        assert_eq!(
            parse_ps_output(stdout),
            vec![
                Container {
                    name: "web".into(),
                    status: "Up 3 hours".into(),
                    id: "a1b2c3".into(),
                },
                Container {
                    name: "db".into(),
                    status: "Up 2 days (healthy)".into(),
                    id: "d4e5f6".into(),
                },
            ]
        );
    }
}
