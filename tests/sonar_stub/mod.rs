use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use serde_json::{Value, json};

#[allow(dead_code)]
#[derive(Debug, Clone, Copy)]
pub enum TopicsBehavior {
    Valid,
    ServerError,
    EmptyMainTopic,
}

#[allow(dead_code)]
#[derive(Debug, Clone, Copy)]
pub enum LessonBehavior {
    Valid,
    Malformed,
    ServerError,
}

#[allow(dead_code)]
#[derive(Debug, Clone, Copy)]
pub enum ProblemBehavior {
    /// Return this many well-formed items.
    Items(usize),
    /// Return this many items, the last one with an unusable `source_url`.
    BadUrl(usize),
}

#[derive(Debug, Clone)]
pub struct SonarStubConfig {
    pub topics: TopicsBehavior,
    pub lesson: LessonBehavior,
    pub problems: ProblemBehavior,
}

pub struct SonarStub {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Value>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl SonarStub {
    pub fn spawn(config: SonarStubConfig) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start sonar stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let mut request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                if request.method() != &tiny_http::Method::Post
                    || request.url() != "/chat/completions"
                {
                    let _ = request.respond(
                        tiny_http::Response::from_string("not found").with_status_code(404),
                    );
                    continue;
                }

                let mut body = String::new();
                if request.as_reader().read_to_string(&mut body).is_err() {
                    let _ = request.respond(
                        tiny_http::Response::from_string("invalid request body")
                            .with_status_code(400),
                    );
                    continue;
                }
                let Ok(parsed) = serde_json::from_str::<Value>(&body) else {
                    let _ = request.respond(
                        tiny_http::Response::from_string("invalid json").with_status_code(400),
                    );
                    continue;
                };
                seen.lock().expect("lock requests").push(parsed.clone());

                let system = parsed
                    .pointer("/messages/0/content")
                    .and_then(Value::as_str)
                    .unwrap_or("");

                let content = if system.contains("learning intent") {
                    match config.topics {
                        TopicsBehavior::Valid => topics_content("Vectors"),
                        TopicsBehavior::EmptyMainTopic => topics_content(""),
                        TopicsBehavior::ServerError => {
                            let _ = request.respond(
                                tiny_http::Response::from_string("upstream overloaded")
                                    .with_status_code(503),
                            );
                            continue;
                        }
                    }
                } else if system.contains("master educator") {
                    match config.lesson {
                        LessonBehavior::Valid => lesson_content(),
                        LessonBehavior::Malformed => {
                            "{\"title\": \"Vectors\", \"sections\": [{\"title\": ".to_owned()
                        }
                        LessonBehavior::ServerError => {
                            let _ = request.respond(
                                tiny_http::Response::from_string("upstream overloaded")
                                    .with_status_code(503),
                            );
                            continue;
                        }
                    }
                } else if system.contains("web research assistant") {
                    problems_content(config.problems)
                } else {
                    let _ = request.respond(
                        tiny_http::Response::from_string("unknown prompt mode")
                            .with_status_code(400),
                    );
                    continue;
                };

                let response_body = json!({
                    "id": "stub",
                    "model": parsed.get("model").cloned().unwrap_or(Value::String("stub-model".to_owned())),
                    "choices": [
                        { "index": 0, "message": { "role": "assistant", "content": content } }
                    ]
                });
                let header =
                    tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                        .expect("build header");
                let response = tiny_http::Response::from_string(response_body.to_string())
                    .with_status_code(200)
                    .with_header(header);
                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            requests,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// Request bodies received so far, in arrival order.
    #[allow(dead_code)]
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().expect("lock requests").clone()
    }
}

impl Drop for SonarStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn topics_content(main_topic: &str) -> String {
    json!({
        "main_topic": main_topic,
        "subtopics": ["Vector Spaces", "Gram-Schmidt", "vector spaces"]
    })
    .to_string()
}

fn lesson_content() -> String {
    let packet = json!({
        "title": "Vectors",
        "learning_path": ["Vector Spaces", "Gram-Schmidt"],
        "sections": [{
            "title": "Inner products",
            "overview": "An inner product measures alignment & length.",
            "key_points": ["Orthogonal means zero inner product", "Norm_2 comes from the dot product"],
            "formulas": ["\\vec{u} \\cdot \\vec{v} = \\sum_i u_i v_i"],
            "diagram": { "caption": "Projection", "instructions": "Drop a perpendicular from v onto u." },
            "worked_example": {
                "prompt": "Orthogonalize (1,1) against (1,0).",
                "steps": ["Project onto (1,0)", "Subtract the projection"],
                "answer": "(0,1)"
            },
            "common_pitfalls": ["Forgetting to normalize"],
            "mini_quiz": [{ "q": "Is (1,0) orthogonal to (0,1)?", "a": "Yes" }]
        }],
        "summary": "Gram-Schmidt builds orthonormal bases.",
        "estimated_total_read_time_minutes": 9
    });
    // Models often wrap JSON in prose; the client has to recover it.
    format!("Here is the packet:\n```json\n{packet}\n```")
}

fn problems_content(behavior: ProblemBehavior) -> String {
    let (count, bad_last) = match behavior {
        ProblemBehavior::Items(count) => (count, false),
        ProblemBehavior::BadUrl(count) => (count, true),
    };
    let items = (1..=count)
        .map(|i| {
            let url = if bad_last && i == count {
                "not-a-url".to_owned()
            } else {
                format!("https://ocw.mit.edu/courses/18-06/pset{i}.pdf")
            };
            json!({
                "question": format!("Problem {i}: Apply Gram-Schmidt to set {i}; report 50% of the norm."),
                "solution": format!("{i}. Normalize the first vector, then subtract projections."),
                "source_title": format!("MIT 18.06 Problem Set {i}"),
                "source_url": url,
                "license": "CC BY-NC-SA"
            })
        })
        .collect::<Vec<_>>();
    Value::Array(items).to_string()
}
