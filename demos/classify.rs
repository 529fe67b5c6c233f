use argh::FromArgs;
use kornia_classify::{
    ClassificationClient, ClientConfig, ImageFile, Notification, NotificationKind, Session,
    render::render_results,
};
use std::path::PathBuf;

// defaults for the client
const DEFAULT_BAR_WIDTH: usize = 30;

#[derive(FromArgs)]
/// Classify an image with the remote classification service
struct ClassifyArgs {
    /// the path to the image
    #[argh(option, short = 'i')]
    image_path: PathBuf,

    /// the service base url, defaults to $CLASSIFY_SERVICE_URL
    #[argh(option, short = 'u')]
    url: Option<String>,

    /// the bearer credential, defaults to $CLASSIFY_SERVICE_KEY
    #[argh(option, short = 'k')]
    key: Option<String>,

    /// width of the confidence bars
    #[argh(option, short = 'w', default = "DEFAULT_BAR_WIDTH")]
    width: usize,
}

fn notify(notification: Notification) {
    match notification.kind {
        NotificationKind::Success => println!("{}: {}", notification.title, notification.message),
        NotificationKind::Error => eprintln!("{}: {}", notification.title, notification.message),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: ClassifyArgs = argh::from_env();

    let config = match (args.url, args.key) {
        (Some(url), Some(key)) => ClientConfig::new(url, key),
        (url, key) => {
            let env = ClientConfig::from_env();
            match (url, key, env) {
                (Some(url), None, Ok(env)) => ClientConfig::new(url, env.credential),
                (None, Some(key), Ok(env)) => ClientConfig::new(env.base_url, key),
                (_, _, env) => env?,
            }
        }
    };

    let mut session = Session::new(ClassificationClient::new(config), notify);

    let file = ImageFile::from_path(&args.image_path);
    if !session.intake_mut().select_file(Some(file)) {
        return Err(format!("{} is not an image", args.image_path.display()).into());
    }
    if !session.wait_intake() {
        return Err(format!("could not read {}", args.image_path.display()).into());
    }

    if session.analyze().await {
        print!(
            "{}",
            render_results(session.image().is_some(), session.predictions(), args.width)
        );
        Ok(())
    } else {
        Err("classification failed".into())
    }
}
