use std::sync::Arc;

use askama::Template;
use tokio::task::JoinHandle;

use crate::models::{Comment, Post};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Something that can put an email on the wire. Called from a blocking task.
pub trait MailTransport: Send + Sync + 'static {
    fn deliver(&self, email: &Email) -> anyhow::Result<()>;
}

/// Writes outgoing mail to the log instead of sending it.
#[derive(Debug, Default)]
pub struct LogTransport;

impl MailTransport for LogTransport {
    fn deliver(&self, email: &Email) -> anyhow::Result<()> {
        tracing::info!(to = %email.to, subject = %email.subject, "outgoing mail");
        tracing::debug!(body = %email.body, "outgoing mail body");
        Ok(())
    }
}

fn deliver_or_log(transport: &dyn MailTransport, email: &Email) {
    if let Err(e) = transport.deliver(email) {
        tracing::warn!(
            error = %e,
            to = %email.to,
            subject = %email.subject,
            "mail delivery failed"
        );
    }
}

#[derive(Template)]
#[template(path = "mail/new_comment.html")]
struct NewCommentMail {
    title: String,
    url: String,
}

#[derive(Template)]
#[template(path = "mail/new_reply.html")]
struct NewReplyMail {
    title: String,
    url: String,
}

#[derive(Clone)]
pub struct Notifier {
    transport: Arc<dyn MailTransport>,
    site_url: String,
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("site_url", &self.site_url)
            .finish_non_exhaustive()
    }
}

impl Notifier {
    pub fn new(transport: Arc<dyn MailTransport>, site_url: &str) -> Self {
        Notifier {
            transport,
            site_url: site_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fire and forget: the request never waits on mail, and a failed
    /// delivery is logged and dropped.
    pub fn send(&self, email: Email) -> JoinHandle<()> {
        let transport = self.transport.clone();
        tokio::task::spawn_blocking(move || deliver_or_log(transport.as_ref(), &email))
    }

    fn post_url(&self, post_id: i64) -> String {
        format!("{}/post/{}#comments", self.site_url, post_id)
    }

    /// Renders `mail` on the blocking task and sends it from there. A
    /// template failure is logged like a delivery failure.
    fn send_template<T>(&self, to: String, subject: &str, mail: T) -> JoinHandle<()>
    where
        T: Template + Send + 'static,
    {
        let transport = self.transport.clone();
        let subject = subject.to_string();
        tokio::task::spawn_blocking(move || {
            let body = match mail.render() {
                Ok(body) => body,
                Err(e) => {
                    tracing::error!(error = %e, subject = %subject, "could not render mail");
                    return;
                }
            };
            deliver_or_log(transport.as_ref(), &Email { to, subject, body });
        })
    }

    /// Tells the owner a visitor left a comment awaiting review.
    pub fn new_comment(&self, post: &Post, owner_email: &str) -> JoinHandle<()> {
        let mail = NewCommentMail {
            title: post.title.clone(),
            url: self.post_url(post.id),
        };
        self.send_template(owner_email.to_string(), "New comment", mail)
    }

    /// Tells a commenter someone replied to them.
    pub fn new_reply(&self, replied: &Comment, post: &Post) -> JoinHandle<()> {
        let mail = NewReplyMail {
            title: post.title.clone(),
            url: self.post_url(replied.post_id),
        };
        self.send_template(replied.email.clone(), "New reply", mail)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::Utc;

    use super::*;

    #[derive(Default)]
    pub struct RecordingTransport {
        pub sent: Mutex<Vec<Email>>,
        pub fail: bool,
    }

    impl MailTransport for RecordingTransport {
        fn deliver(&self, email: &Email) -> anyhow::Result<()> {
            self.sent.lock().unwrap().push(email.clone());
            if self.fail {
                anyhow::bail!("smtp unavailable");
            }
            Ok(())
        }
    }

    fn post() -> Post {
        let now = Utc::now();
        Post {
            id: 5,
            title: "Hello".to_string(),
            body: String::new(),
            created_time: now,
            updated_time: now,
            no_comment: false,
            category_id: 1,
        }
    }

    #[tokio::test]
    async fn new_comment_mail_goes_to_owner() {
        let transport = Arc::new(RecordingTransport::default());
        let notifier = Notifier::new(transport.clone(), "https://blog.example/");
        notifier.new_comment(&post(), "owner@example.com").await.unwrap();
        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "owner@example.com");
        assert_eq!(sent[0].subject, "New comment");
        assert!(sent[0].body.contains("https://blog.example/post/5#comments"));
    }

    #[tokio::test]
    async fn reply_mail_goes_to_replied_author() {
        let transport = Arc::new(RecordingTransport::default());
        let notifier = Notifier::new(transport.clone(), "https://blog.example");
        let now = Utc::now();
        let replied = Comment {
            id: 1,
            author: "Ann".to_string(),
            email: "ann@example.com".to_string(),
            site: None,
            body: "hi".to_string(),
            created_time: now,
            updated_time: now,
            reviewed: true,
            reviewed_time: Some(now),
            from_admin: false,
            replied_id: None,
            post_id: 5,
        };
        notifier.new_reply(&replied, &post()).await.unwrap();
        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent[0].to, "ann@example.com");
        assert_eq!(sent[0].subject, "New reply");
    }

    #[tokio::test]
    async fn post_title_is_escaped_in_mail_body() {
        let transport = Arc::new(RecordingTransport::default());
        let notifier = Notifier::new(transport.clone(), "https://blog.example");
        let mut hostile = post();
        hostile.title = "<script>alert(1)</script>".to_string();
        notifier.new_comment(&hostile, "owner@example.com").await.unwrap();
        let sent = transport.sent.lock().unwrap();
        assert!(!sent[0].body.contains("<script>"));
        assert!(sent[0].body.contains("&lt;script&gt;"));
    }

    #[tokio::test]
    async fn failed_delivery_is_swallowed() {
        let transport = Arc::new(RecordingTransport {
            fail: true,
            ..Default::default()
        });
        let notifier = Notifier::new(transport.clone(), "http://localhost");
        assert!(notifier.new_comment(&post(), "owner@example.com").await.is_ok());
        assert_eq!(transport.sent.lock().unwrap().len(), 1);
    }
}
